// src/downloader/assembler.rs

use super::segment_path;
use crate::error::{AppError, AppResult};
use log::debug;
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

/// 按清单顺序 (0..N) 把分片临时文件合并为单个输出文件。
/// 抓取的完成顺序无关紧要，这里的顺序读取是唯一的排序点。
/// 任何索引缺失都整体拒绝，绝不写出部分结果；N=0 产出空文件。
pub fn assemble(temp_dir: &Path, num_segments: usize, output_path: &Path) -> AppResult<()> {
    let missing: Vec<usize> = (0..num_segments)
        .filter(|i| !segment_path(temp_dir, *i).exists())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::IncompleteAssembly {
            missing,
            temp_dir: temp_dir.to_path_buf(),
        });
    }

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    // 先写 .tmp 再改名，输出文件要么完整要么不存在
    let temp_output_path = output_path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&temp_output_path)?);
    for i in 0..num_segments {
        let mut reader = File::open(segment_path(temp_dir, i))?;
        io::copy(&mut reader, &mut writer)?;
    }
    writer.flush()?;
    fs::rename(&temp_output_path, output_path)?;
    debug!("合并完成: {} 个分片 -> {:?}", num_segments, output_path);
    Ok(())
}
