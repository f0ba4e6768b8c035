//! # 直方图匹配
//!
//! 将强度列替换为参考分布的秩轮廓：参考强度降序排列后映射到归一化秩
//! 0-100，再按输入长度在 0-100 上等间距重采样。
//!
//! 输出第 i 个值只取决于秩 i，与输入原有的强度顺序无关（秩替换，
//! 而非保序变换），因此输出总是单调不增。
//!
//! ## 依赖关系
//! - 被 `pipeline/`, `commands/transform.rs` 调用
//! - 参考强度由 `reference.rs` 解析
//! - 使用 `intensity/stats.rs`

use crate::error::{MergePrepError, Result};
use crate::intensity::stats;

/// 参考分布的秩轮廓
#[derive(Debug, Clone, PartialEq)]
pub struct RankProfile {
    /// 归一化秩 (0-100)
    ranks: Vec<f64>,
    /// 降序排列的参考强度
    values: Vec<f64>,
}

impl RankProfile {
    /// 由参考强度构造；非有限值被丢弃，全部无效时报错
    pub fn new(reference: &[f64]) -> Result<Self> {
        let mut values: Vec<f64> = reference.iter().copied().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return Err(MergePrepError::EmptyReference);
        }

        values.sort_by(|a, b| b.total_cmp(a));
        let ranks = stats::linspace(0.0, 100.0, values.len());

        Ok(RankProfile { ranks, values })
    }

    /// 参考点数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 最大参考强度
    pub fn max(&self) -> f64 {
        self.values[0]
    }

    /// 在归一化秩 x (0-100) 处取值
    pub fn at(&self, rank: f64) -> f64 {
        stats::interp(rank, &self.ranks, &self.values)
    }

    /// 按 n 个等间距秩重采样
    pub fn resample(&self, n: usize) -> Vec<f64> {
        stats::linspace(0.0, 100.0, n)
            .into_iter()
            .map(|x| self.at(x))
            .collect()
    }

    /// 对强度列做秩替换，输出与输入等长
    pub fn apply(&self, intensities: &[f64]) -> Vec<f64> {
        self.resample(intensities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_histogram(intensities: &[f64], reference: &[f64]) -> Result<Vec<f64>> {
        Ok(RankProfile::new(reference)?.apply(intensities))
    }

    #[test]
    fn test_equal_length_returns_sorted_reference() {
        let intensities = [1.0, 2.0, 3.0, 4.0];
        let reference = [5.0, 40.0, 10.0, 20.0];
        let out = match_histogram(&intensities, &reference).unwrap();

        assert_eq!(out, vec![40.0, 20.0, 10.0, 5.0]);
    }

    #[test]
    fn test_output_ignores_input_order() {
        let reference = [5.0, 40.0, 10.0, 20.0];
        let a = match_histogram(&[4.0, 3.0, 2.0, 1.0], &reference).unwrap();
        let b = match_histogram(&[1.0, 4.0, 2.0, 3.0], &reference).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_monotonic_non_increasing() {
        let reference: Vec<f64> = (0..37).map(|i| ((i * 7919) % 101) as f64).collect();
        let intensities = vec![1.0; 250];
        let out = match_histogram(&intensities, &reference).unwrap();

        assert_eq!(out.len(), 250);
        for w in out.windows(2) {
            assert!(w[0] >= w[1], "{} < {}", w[0], w[1]);
        }
        assert_eq!(out[0], 100.0);
    }

    #[test]
    fn test_resample_interpolates() {
        let profile = RankProfile::new(&[0.0, 100.0]).unwrap();
        assert_eq!(profile.resample(3), vec![100.0, 50.0, 0.0]);
        assert_eq!(profile.max(), 100.0);
        assert_eq!(profile.len(), 2);
    }

    #[test]
    fn test_degenerate_references() {
        assert!(matches!(
            RankProfile::new(&[]),
            Err(MergePrepError::EmptyReference)
        ));
        assert!(matches!(
            RankProfile::new(&[f64::NAN, f64::INFINITY]),
            Err(MergePrepError::EmptyReference)
        ));

        let single = RankProfile::new(&[7.0, f64::NAN]).unwrap();
        assert_eq!(single.apply(&[1.0, 2.0, 3.0]), vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(match_histogram(&[], &[1.0, 2.0]).unwrap().is_empty());
    }
}
