//! # 衍射点数据模型
//!
//! 单个衍射点（Miller 指数 + 强度 + 误差）及其有序列表。
//!
//! 强度列 (`IntensityArray`) 与衍射点一一对应：分类和直方图匹配只替换强度值，
//! 不改变长度和顺序。
//!
//! ## 依赖关系
//! - 被 `parsers/hkl.rs`, `pipeline/`, `writers/` 使用
//! - 无外部模块依赖

use crate::error::{MergePrepError, Result};

/// 单个衍射点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionRecord {
    pub h: i32,
    pub k: i32,
    pub l: i32,
    /// 积分强度
    pub intensity: f64,
    /// 强度误差 σ(I)
    pub sigma: f64,
}

impl ReflectionRecord {
    pub fn new(h: i32, k: i32, l: i32, intensity: f64, sigma: f64) -> Self {
        ReflectionRecord {
            h,
            k,
            l,
            intensity,
            sigma,
        }
    }

    /// Miller 指数三元组
    pub fn hkl(&self) -> (i32, i32, i32) {
        (self.h, self.k, self.l)
    }
}

/// 衍射点列表（一个物相合并后的数据集）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReflectionList {
    pub records: Vec<ReflectionRecord>,
}

impl ReflectionList {
    pub fn new(records: Vec<ReflectionRecord>) -> Self {
        ReflectionList { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 提取强度列
    pub fn intensities(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.intensity).collect()
    }

    /// 按位置替换强度列，长度必须一致
    pub fn set_intensities(&mut self, intensities: &[f64]) -> Result<()> {
        if intensities.len() != self.records.len() {
            return Err(MergePrepError::InvalidArgument(format!(
                "intensity column has {} values for {} reflections",
                intensities.len(),
                self.records.len()
            )));
        }

        for (record, &value) in self.records.iter_mut().zip(intensities) {
            record.intensity = value;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReflectionList {
        ReflectionList::new(vec![
            ReflectionRecord::new(1, 0, 0, 10.0, 1.0),
            ReflectionRecord::new(0, 1, 0, 20.0, 2.0),
            ReflectionRecord::new(0, 0, 1, 30.0, 3.0),
        ])
    }

    #[test]
    fn test_set_intensities_keeps_indices() {
        let mut list = sample();
        list.set_intensities(&[5.0, 6.0, 7.0]).unwrap();

        assert_eq!(list.intensities(), vec![5.0, 6.0, 7.0]);
        assert_eq!(list.records[1].hkl(), (0, 1, 0));
        assert_eq!(list.records[2].sigma, 3.0);
    }

    #[test]
    fn test_set_intensities_length_mismatch() {
        let mut list = sample();
        assert!(list.set_intensities(&[1.0, 2.0]).is_err());
        assert_eq!(list.intensities(), vec![10.0, 20.0, 30.0]);
    }
}
