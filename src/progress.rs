// src/progress.rs

use indicatif::ProgressBar;

/// 进度上报接口。下载池通过它上报进度，而不是依赖全局可变计数器，
/// 测试也通过同一个接口注入探针。
pub trait Progress: Send + Sync {
    /// 总量已知时调用 (分片模式为分片数，直链模式为字节数)。
    fn set_total(&self, total: u64) {
        let _ = total;
    }
    /// 一个分片即将开始下载。
    fn segment_started(&self) {}
    /// 一个分片结束 (无论成败)。
    fn segment_finished(&self, ok: bool);
    /// 直链模式下收到一块数据。
    fn bytes_received(&self, n: u64) {
        let _ = n;
    }
}

/// 静默实现，供批量模式的内部步骤与测试使用。
pub struct NoProgress;

impl Progress for NoProgress {
    fn segment_finished(&self, _ok: bool) {}
}

/// 基于 indicatif 进度条的实现。
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Progress for BarProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn segment_finished(&self, _ok: bool) {
        self.bar.inc(1);
    }

    fn bytes_received(&self, n: u64) {
        self.bar.inc(n);
    }
}
