// tests/manifest_download_test.rs

use clap::Parser as _;
use std::fs;
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tempfile::tempdir;
use ts_dl::{
    DownloadJobContext,
    cli::Cli,
    client::HttpClient,
    config::AppConfig,
    downloader::{FetchReport, M3u8Job, SegmentFetcherPool, assemble, segment_path},
    error::AppError,
    manifest::Manifest,
    progress::{NoProgress, Progress},
};
use url::Url;

/// 构造一个包含 n 个相对分片地址的媒体播放列表文本
fn playlist_text(n: usize) -> String {
    let mut text = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n");
    for i in 0..n {
        text.push_str(&format!("#EXTINF:10.0,\nseg{}.ts\n", i));
    }
    text.push_str("#EXT-X-ENDLIST\n");
    text
}

fn test_client() -> Arc<HttpClient> {
    let config = AppConfig::default();
    Arc::new(HttpClient::new(&config).expect("创建测试客户端失败"))
}

fn test_pool(client: Arc<HttpClient>, workers: usize) -> SegmentFetcherPool {
    SegmentFetcherPool::new(client, workers, Arc::new(AtomicBool::new(false)))
}

async fn fetch_into(
    server_url: &str,
    n: usize,
    workers: usize,
    temp_dir: &Path,
    progress: &dyn Progress,
) -> FetchReport {
    let base = Url::parse(&format!("{}/playlist.m3u8", server_url)).unwrap();
    let manifest = Manifest::parse(&playlist_text(n), &base).unwrap();
    test_pool(test_client(), workers)
        .fetch_all(&manifest, temp_dir, progress)
        .await
        .expect("抓取过程本身不应失败")
}

// --- 抓取 + 合并属性 ---

#[tokio::test(flavor = "multi_thread")]
async fn test_output_matches_manifest_order_regardless_of_completion_order() {
    let mut server = mockito::Server::new_async().await;
    let n = 8;
    let mut mocks = Vec::new();
    for i in 0..n {
        // 内容各不相同，任何乱序合并都会被发现
        mocks.push(
            server
                .mock("GET", format!("/seg{}.ts", i).as_str())
                .with_body(format!("payload-{};", i))
                .create_async()
                .await,
        );
    }

    let temp = tempdir().unwrap();
    let report = fetch_into(&server.url(), n, 5, temp.path(), &NoProgress).await;
    assert!(report.is_complete());

    let out = temp.path().join("out.mp4");
    assemble(temp.path(), n, &out).unwrap();

    let expected: String = (0..n).map(|i| format!("payload-{};", i)).collect();
    assert_eq!(fs::read_to_string(&out).unwrap(), expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_failed_segment_blocks_assembly_and_keeps_temp_files() {
    let mut server = mockito::Server::new_async().await;
    let n = 5;
    let mut mocks = Vec::new();
    for i in 0..n {
        let mock = server.mock("GET", format!("/seg{}.ts", i).as_str());
        // 索引 2 模拟失败，其余正常
        let mock = if i == 2 {
            mock.with_status(404)
        } else {
            mock.with_body(format!("payload-{};", i))
        };
        mocks.push(mock.create_async().await);
    }

    let temp = tempdir().unwrap();
    let report = fetch_into(&server.url(), n, 5, temp.path(), &NoProgress).await;
    assert!(!report.is_complete());
    assert_eq!(report.missing_indices(), vec![2]);

    // 集合不完整: 合并被整体拒绝，不产出输出文件
    let out = temp.path().join("out.mp4");
    let err = assemble(temp.path(), n, &out).unwrap_err();
    assert!(matches!(err, AppError::IncompleteAssembly { ref missing, .. } if *missing == vec![2]));
    assert!(!out.exists());

    // 已抓取索引的临时文件保留在磁盘上供诊断
    for i in [0usize, 1, 3, 4] {
        assert!(segment_path(temp.path(), i).exists());
    }
    assert!(!segment_path(temp.path(), 2).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pool_never_exceeds_worker_limit() {
    struct ConcurrencyProbe {
        current: AtomicUsize,
        max: AtomicUsize,
    }

    impl Progress for ConcurrencyProbe {
        fn segment_started(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(now, Ordering::SeqCst);
        }
        fn segment_finished(&self, _ok: bool) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    let mut server = mockito::Server::new_async().await;
    let n = 50;
    let mut mocks = Vec::new();
    for i in 0..n {
        mocks.push(
            server
                .mock("GET", format!("/seg{}.ts", i).as_str())
                .with_body("x")
                .create_async()
                .await,
        );
    }

    let probe = ConcurrencyProbe {
        current: AtomicUsize::new(0),
        max: AtomicUsize::new(0),
    };
    let temp = tempdir().unwrap();
    let report = fetch_into(&server.url(), n, 5, temp.path(), &probe).await;

    assert!(report.is_complete());
    assert_eq!(report.completed.len(), n);
    let max_in_flight = probe.max.load(Ordering::SeqCst);
    assert!(
        max_in_flight <= 5,
        "同时在途的抓取数不应超过并发上限 5，实测 {}",
        max_in_flight
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_preset_cancellation_starts_no_fetches() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let base = Url::parse(&format!("{}/playlist.m3u8", server.url())).unwrap();
    let manifest = Manifest::parse(&playlist_text(10), &base).unwrap();

    let token = Arc::new(AtomicBool::new(true));
    let pool = SegmentFetcherPool::new(test_client(), 5, token);
    let temp = tempdir().unwrap();

    let err = pool
        .fetch_all(&manifest, temp.path(), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserInterrupt));
    mock.assert_async().await;
}

// --- 完整任务级行为 (M3u8Job: 清理语义) ---

fn job_context(args: Vec<&str>) -> DownloadJobContext {
    let config = Arc::new(AppConfig::default());
    let http_client = Arc::new(HttpClient::new(&config).unwrap());
    DownloadJobContext {
        config,
        http_client,
        args: Arc::new(Cli::try_parse_from(args).unwrap()),
        cancellation_token: Arc::new(AtomicBool::new(false)),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_job_success_removes_temp_dir() {
    let mut server = mockito::Server::new_async().await;
    let n = 4;
    let _playlist_mock = server
        .mock("GET", "/playlist.m3u8")
        .with_body(playlist_text(n))
        .create_async()
        .await;
    let mut mocks = Vec::new();
    for i in 0..n {
        mocks.push(
            server
                .mock("GET", format!("/seg{}.ts", i).as_str())
                .with_body(format!("seg{};", i))
                .create_async()
                .await,
        );
    }

    let work = tempdir().unwrap();
    let temp_dir = work.path().join("segments");
    let out = work.path().join("out.mp4");
    let m3u8_url = format!("{}/playlist.m3u8", server.url());

    let context = job_context(vec![
        "ts-dl",
        "--url",
        &m3u8_url,
        "--temp-dir",
        temp_dir.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);

    M3u8Job::new(context)
        .run(&m3u8_url, &out, &NoProgress)
        .await
        .unwrap();

    let expected: String = (0..n).map(|i| format!("seg{};", i)).collect();
    assert_eq!(fs::read_to_string(&out).unwrap(), expected);
    // 成功后分片临时目录被移除
    assert!(!temp_dir.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_job_failure_keeps_temp_dir_for_diagnosis() {
    let mut server = mockito::Server::new_async().await;
    let n = 3;
    let _playlist_mock = server
        .mock("GET", "/playlist.m3u8")
        .with_body(playlist_text(n))
        .create_async()
        .await;
    let _m0 = server.mock("GET", "/seg0.ts").with_body("a").create_async().await;
    let _m1 = server.mock("GET", "/seg1.ts").with_status(500).create_async().await;
    let _m2 = server.mock("GET", "/seg2.ts").with_body("c").create_async().await;

    let work = tempdir().unwrap();
    let temp_dir = work.path().join("segments");
    let out = work.path().join("out.mp4");
    let m3u8_url = format!("{}/playlist.m3u8", server.url());

    let context = job_context(vec![
        "ts-dl",
        "--url",
        &m3u8_url,
        "--temp-dir",
        temp_dir.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);

    let err = M3u8Job::new(context)
        .run(&m3u8_url, &out, &NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::IncompleteAssembly { ref missing, .. } if *missing == vec![1]));
    assert!(!out.exists());
    // 失败时临时目录原样保留，已抓取的分片留在磁盘上
    assert!(temp_dir.exists());
    assert!(segment_path(&temp_dir, 0).exists());
    assert!(segment_path(&temp_dir, 2).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_job_empty_manifest_produces_empty_output() {
    let mut server = mockito::Server::new_async().await;
    let _playlist_mock = server
        .mock("GET", "/playlist.m3u8")
        .with_body(playlist_text(0))
        .create_async()
        .await;

    let work = tempdir().unwrap();
    let temp_dir = work.path().join("segments");
    let out = work.path().join("out.mp4");
    let m3u8_url = format!("{}/playlist.m3u8", server.url());

    let context = job_context(vec![
        "ts-dl",
        "--url",
        &m3u8_url,
        "--temp-dir",
        temp_dir.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);

    M3u8Job::new(context)
        .run(&m3u8_url, &out, &NoProgress)
        .await
        .unwrap();

    assert_eq!(fs::metadata(&out).unwrap().len(), 0);
    assert!(!temp_dir.exists());
}
