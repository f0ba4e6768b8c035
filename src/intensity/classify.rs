//! # 强度分级（kleinify）
//!
//! 按强/中/弱三档对衍射强度分组，并以各组均值替换组内全部强度。
//!
//! ## 阈值约定
//! - 阈值 ≤ 1：最大强度的分数，cutoff = t · max(I)
//! - 阈值 > 1：强度分布的百分位数 (0-100)，线性插值
//!
//! ## 分组规则
//! - strong: I > strong_cutoff
//! - weak:   I < weak_cutoff
//! - medium: 其余
//!
//! weak_cutoff > strong_cutoff 时两组可能重叠，视为错误。
//!
//! ## 参考
//! Klein (2011), doi:10.1524/zkri.2012.1568
//!
//! ## 依赖关系
//! - 被 `pipeline/phase.rs`, `commands/transform.rs` 调用
//! - 使用 `intensity/stats.rs`

use crate::error::{MergePrepError, Result};
use crate::intensity::stats;

use std::fmt;

/// 单个阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// 最大强度的分数 (0-1)
    Fraction(f64),
    /// 百分位数 (1-100]
    Percentile(f64),
}

impl Threshold {
    /// 按数值大小判定阈值类型
    pub fn from_value(value: f64) -> Self {
        if value > 1.0 {
            Threshold::Percentile(value)
        } else {
            Threshold::Fraction(value)
        }
    }

    /// 计算实际强度截断值
    pub fn resolve(&self, intensities: &[f64]) -> Option<f64> {
        match *self {
            Threshold::Fraction(t) => stats::max(intensities).map(|m| t * m),
            Threshold::Percentile(q) => stats::percentile(intensities, q),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Fraction(t) => write!(f, "{} x max", t),
            Threshold::Percentile(q) => write!(f, "{}th percentile", q),
        }
    }
}

/// 强/弱阈值对
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub strong: Threshold,
    pub weak: Threshold,
}

impl Thresholds {
    /// 构造并校验阈值对
    ///
    /// 同类阈值可以直接比较，weak > strong 立即报错；
    /// 混合类型只能在得到实际截断值后检查。
    pub fn new(strong: f64, weak: f64) -> Result<Self> {
        for (name, value) in [("strong", strong), ("weak", weak)] {
            if !value.is_finite() || value < 0.0 || value > 100.0 {
                return Err(MergePrepError::InvalidArgument(format!(
                    "{} threshold must be within [0, 100], got {}",
                    name, value
                )));
            }
        }

        let thresholds = Thresholds {
            strong: Threshold::from_value(strong),
            weak: Threshold::from_value(weak),
        };
        if thresholds.same_kind() && weak > strong {
            return Err(MergePrepError::InvalidThresholds { strong, weak });
        }

        Ok(thresholds)
    }

    /// 两个阈值同为分数或同为百分位数
    pub fn same_kind(&self) -> bool {
        matches!(
            (self.strong, self.weak),
            (Threshold::Fraction(_), Threshold::Fraction(_))
                | (Threshold::Percentile(_), Threshold::Percentile(_))
        )
    }
}

/// 强度所属分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Strong,
    Medium,
    Weak,
}

/// 分组结果
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub strong_cutoff: f64,
    pub weak_cutoff: f64,
    /// 与输入逐位置对应
    pub buckets: Vec<Bucket>,
}

impl Partition {
    pub fn count(&self, bucket: Bucket) -> usize {
        self.buckets.iter().filter(|b| **b == bucket).count()
    }

    /// 属于某组的位置索引
    pub fn indices(&self, bucket: Bucket) -> Vec<usize> {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == bucket)
            .map(|(i, _)| i)
            .collect()
    }
}

/// 分级摘要（仅用于诊断输出）
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationSummary {
    pub strong_cutoff: f64,
    pub weak_cutoff: f64,
    pub n_strong: usize,
    pub n_medium: usize,
    pub n_weak: usize,
}

impl fmt::Display for ClassificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N(strong/medium/weak): {} / {} / {}, thresh(strong/weak): {:.2} / {:.2}",
            self.n_strong, self.n_medium, self.n_weak, self.strong_cutoff, self.weak_cutoff
        )
    }
}

/// 将强度分为强/中/弱三组
pub fn partition(intensities: &[f64], thresholds: &Thresholds) -> Result<Partition> {
    let (Some(strong_cutoff), Some(weak_cutoff)) = (
        thresholds.strong.resolve(intensities),
        thresholds.weak.resolve(intensities),
    ) else {
        return Ok(Partition {
            strong_cutoff: 0.0,
            weak_cutoff: 0.0,
            buckets: vec![],
        });
    };

    // 同类阈值已在构造时检查；max(I) ≤ 0 时分数截断值的大小关系会反转
    if !thresholds.same_kind() && weak_cutoff > strong_cutoff {
        return Err(MergePrepError::InvalidThresholds {
            strong: strong_cutoff,
            weak: weak_cutoff,
        });
    }

    let buckets = intensities
        .iter()
        .map(|&i| {
            if i > strong_cutoff {
                Bucket::Strong
            } else if i < weak_cutoff {
                Bucket::Weak
            } else {
                Bucket::Medium
            }
        })
        .collect();

    Ok(Partition {
        strong_cutoff,
        weak_cutoff,
        buckets,
    })
}

/// 原位替换：每组强度替换为组内均值，空组不做任何处理
pub fn kleinify(intensities: &mut [f64], thresholds: &Thresholds) -> Result<ClassificationSummary> {
    let partition = partition(intensities, thresholds)?;

    for bucket in [Bucket::Strong, Bucket::Medium, Bucket::Weak] {
        let indices = partition.indices(bucket);
        let values: Vec<f64> = indices.iter().map(|&i| intensities[i]).collect();
        if let Some(m) = stats::mean(&values) {
            for i in indices {
                intensities[i] = m;
            }
        }
    }

    Ok(ClassificationSummary {
        strong_cutoff: partition.strong_cutoff,
        weak_cutoff: partition.weak_cutoff,
        n_strong: partition.count(Bucket::Strong),
        n_medium: partition.count(Bucket::Medium),
        n_weak: partition.count(Bucket::Weak),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tens() -> Vec<f64> {
        (1..=10).map(|v| v as f64 * 10.0).collect()
    }

    #[test]
    fn test_fraction_thresholds_membership() {
        let values = tens();
        let thresholds = Thresholds::new(0.5, 0.2).unwrap();
        let p = partition(&values, &thresholds).unwrap();

        assert_eq!(p.strong_cutoff, 50.0);
        assert_eq!(p.weak_cutoff, 20.0);
        assert_eq!(p.indices(Bucket::Strong), vec![5, 6, 7, 8, 9]);
        assert_eq!(p.indices(Bucket::Medium), vec![1, 2, 3, 4]);
        assert_eq!(p.indices(Bucket::Weak), vec![0]);
    }

    #[test]
    fn test_kleinify_replaces_with_bucket_means() {
        let mut values = tens();
        let thresholds = Thresholds::new(0.5, 0.2).unwrap();
        let summary = kleinify(&mut values, &thresholds).unwrap();

        assert_eq!(
            values,
            vec![10.0, 35.0, 35.0, 35.0, 35.0, 80.0, 80.0, 80.0, 80.0, 80.0]
        );
        assert_eq!((summary.n_strong, summary.n_medium, summary.n_weak), (5, 4, 1));
    }

    #[test]
    fn test_percentile_thresholds() {
        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let thresholds = Thresholds::new(90.0, 60.0).unwrap();
        let p = partition(&values, &thresholds).unwrap();

        assert!((p.strong_cutoff - 90.1).abs() < 1e-9);
        assert!((p.weak_cutoff - 60.4).abs() < 1e-9);
        assert_eq!(p.count(Bucket::Strong), 10);
        assert_eq!(p.count(Bucket::Weak), 60);
        assert_eq!(p.count(Bucket::Medium), 30);
    }

    #[test]
    fn test_partition_is_exhaustive() {
        let values = vec![5.0, 1.0, 9.0, 3.3, 7.2, 0.0, 12.5, 4.4];
        let thresholds = Thresholds::new(0.6, 0.25).unwrap();
        let p = partition(&values, &thresholds).unwrap();

        assert_eq!(p.buckets.len(), values.len());
        assert_eq!(
            p.count(Bucket::Strong) + p.count(Bucket::Medium) + p.count(Bucket::Weak),
            values.len()
        );
    }

    #[test]
    fn test_empty_bucket_is_noop() {
        // all values equal: nothing strong, nothing weak
        let mut values = vec![4.0; 6];
        let thresholds = Thresholds::new(1.0, 0.5).unwrap();
        let summary = kleinify(&mut values, &thresholds).unwrap();

        assert_eq!(summary.n_strong, 0);
        assert_eq!(summary.n_weak, 0);
        assert_eq!(values, vec![4.0; 6]);
    }

    #[test]
    fn test_non_positive_intensities() {
        // max = -10: strong cutoff -5 lies below weak cutoff -2
        let mut values = vec![-10.0, -20.0, -30.0, -40.0];
        let thresholds = Thresholds::new(0.5, 0.2).unwrap();
        let summary = kleinify(&mut values, &thresholds).unwrap();

        assert_eq!(summary.strong_cutoff, -5.0);
        assert_eq!(summary.weak_cutoff, -2.0);
        assert_eq!((summary.n_strong, summary.n_medium, summary.n_weak), (0, 0, 4));
        assert_eq!(values, vec![-25.0; 4]);
    }

    #[test]
    fn test_empty_input() {
        let mut values: Vec<f64> = vec![];
        let thresholds = Thresholds::new(0.5, 0.2).unwrap();
        let summary = kleinify(&mut values, &thresholds).unwrap();
        assert_eq!(summary.n_medium, 0);
    }

    #[test]
    fn test_inverted_same_kind_rejected() {
        assert!(matches!(
            Thresholds::new(0.2, 0.5),
            Err(MergePrepError::InvalidThresholds { .. })
        ));
        assert!(matches!(
            Thresholds::new(60.0, 90.0),
            Err(MergePrepError::InvalidThresholds { .. })
        ));
        assert!(Thresholds::new(150.0, 10.0).is_err());
        assert!(Thresholds::new(0.5, -0.1).is_err());
    }

    #[test]
    fn test_inverted_mixed_kind_rejected_on_resolve() {
        // strong = 0.1 x max = 10, weak = 90th percentile = 90.1
        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let thresholds = Thresholds::new(0.1, 90.0).unwrap();
        assert!(matches!(
            partition(&values, &thresholds),
            Err(MergePrepError::InvalidThresholds { .. })
        ));
    }
}
