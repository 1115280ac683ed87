//! 通用常量.

/// CT HU 值常量.
pub mod hu {
    /// 气道 (空气) 上界. 严格小于该值的体素视为气道候选.
    pub const AIRWAY_CUTOFF: f32 = -850.0;

    /// 肺实质 HU 区间下界 (闭).
    pub const LUNG_LOW: f32 = -1000.0;

    /// 肺实质 HU 区间上界 (闭).
    pub const LUNG_HIGH: f32 = -400.0;

    /// 软组织 HU 区间下界 (闭). 仅用于诊断.
    pub const SOFT_TISSUE_LOW: f32 = -100.0;

    /// 软组织 HU 区间上界 (闭). 仅用于诊断.
    pub const SOFT_TISSUE_HIGH: f32 = 300.0;

    /// 骨骼 HU 下界 (闭). 仅用于诊断.
    pub const BONE_LOW: f32 = 300.0;

    /// 诊断直方图统计范围下界. 更低的值计入首个分箱.
    pub const HISTOGRAM_LOW: f32 = -1024.0;

    /// 诊断直方图统计范围上界. 更高的值计入末尾分箱.
    pub const HISTOGRAM_HIGH: f32 = 1024.0;
}

/// 流水线参数的默认值. 这些值需要针对新数据集重新实验标定.
pub mod defaults {
    /// 肺掩膜闭运算半径 (体素).
    pub const LUNG_CLOSING_RADIUS: usize = 2;

    /// 肺掩膜最小连通域体素数.
    pub const LUNG_MIN_VOXELS: usize = 500;

    /// 肺掩膜头侧裁剪切片数.
    pub const LUNG_TRIM_TOP: usize = 0;

    /// 肺掩膜足侧裁剪切片数 (横膈以下的腹部内容).
    pub const LUNG_TRIM_BOTTOM: usize = 10;

    /// 保留的肺连通域个数 (左肺 + 右肺).
    pub const LUNG_COMPONENTS: usize = 2;

    /// 气道壁厚近似的膨胀半径 (体素).
    pub const AIRWAY_WALL_RADIUS: usize = 1;

    /// 气道掩膜最小连通域体素数.
    pub const AIRWAY_MIN_VOXELS: usize = 50;

    /// 气道掩膜头侧裁剪切片数.
    pub const AIRWAY_TRIM_TOP: usize = 5;

    /// 气道掩膜足侧裁剪切片数.
    pub const AIRWAY_TRIM_BOTTOM: usize = 5;

    /// 分叉处外壳膨胀半径 (体素).
    pub const SHELL_RADIUS: usize = 1;

    /// 触发外壳补偿的最少分支数.
    pub const BRANCH_TRIGGER: usize = 2;

    /// 细分支回收的邻近门限 (毫米).
    pub const PROXIMITY_MM: f64 = 5.0;

    /// 细分支回收的最大合并轮次.
    pub const MAX_RECOVERY_PASSES: usize = 16;

    /// 骨架边缘裁剪宽度 (体素).
    pub const EDGE_MARGIN: usize = 120;

    /// 诊断直方图分箱宽度 (HU).
    pub const HISTOGRAM_BIN_WIDTH: f32 = 50.0;

    /// 诊断直方图的最大分箱个数.
    pub const MAX_HISTOGRAM_BINS: usize = 1 << 16;
}
