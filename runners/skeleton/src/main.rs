//! 肺与气道骨架提取的命令行运行器.
//!
//! 输入扫描与输出目录分别由 `$CT_SCAN_PATH` 和 `$CT_OUTPUT_DIR` 指定,
//! 未设置时使用 `$HOME/dataset/lung/` 下的默认位置.

mod result;
mod runner;

fn main() -> ct_airway::Result<()> {
    simple_logger::init_with_level(log::Level::Info).expect("Logger initialization error");
    let res = runner::run()?;
    res.analyze();
    Ok(())
}
