use super::Offset3d;
use itertools::iproduct;

/// 以体素为单位的球形结构元. 半径为 0 时只包含中心.
///
/// 结构元关于中心对称, 因此膨胀与腐蚀互为伴随.
#[derive(Clone, Debug)]
pub struct Ball {
    radius: usize,
    offsets: Vec<Offset3d>,
}

impl Ball {
    /// 收集满足 `dz^2 + dh^2 + dw^2 <= radius^2` 的全部偏移量.
    pub fn new(radius: usize) -> Self {
        let r = radius as isize;
        let offsets = iproduct!(-r..=r, -r..=r, -r..=r)
            .filter(|&(z, h, w)| z * z + h * h + w * w <= r * r)
            .collect();
        Self { radius, offsets }
    }

    /// 半径.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// 全部偏移量 (包括中心).
    #[inline]
    pub fn offsets(&self) -> &[Offset3d] {
        &self.offsets
    }
}

#[cfg(test)]
mod tests {
    use super::Ball;

    #[test]
    fn test_ball_sizes() {
        assert_eq!(Ball::new(0).offsets(), &[(0, 0, 0)]);
        // 中心 + 6 个面邻居.
        assert_eq!(Ball::new(1).offsets().len(), 7);
        // 中心 + 6 + 12 + 8 + 6.
        assert_eq!(Ball::new(2).offsets().len(), 33);
        assert!(Ball::new(3)
            .offsets()
            .iter()
            .all(|&(z, h, w)| Ball::new(3).offsets().contains(&(-z, -h, -w))));
    }
}
