//! # 原子散射因子表
//!
//! 以可注入的只读查询服务提供四高斯散射因子参数：
//! f(s) = Σᵢ aᵢ exp(-bᵢ s²) + c，其中 s = sin(θ)/λ
//!
//! ## 数据来源
//! - X 射线：International Tables for Crystallography, Vol. C, Table 6.1.1.4
//! - 电子：Doyle & Turner (1968), Acta Cryst. A24, 390（c = 0）
//! - 共价半径与原子量：用于 SHELX SFAC 长格式
//!
//! ## 依赖关系
//! - 被 `diffraction/structure_factors.rs` 和 `writers/shelx.rs` 使用
//! - 纯静态数据，无外部依赖

use std::collections::HashMap;
use std::sync::LazyLock;

/// 四高斯散射因子参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianParams {
    pub a: [f64; 4],
    pub b: [f64; 4],
    pub c: f64,
}

impl GaussianParams {
    /// 计算散射因子 f(s)，其中 s = sin(θ)/λ
    pub fn calculate(&self, s: f64) -> f64 {
        let s2 = s * s;
        self.a
            .iter()
            .zip(&self.b)
            .fold(self.c, |f, (a, b)| f + a * (-b * s2).exp())
    }
}

/// 散射因子查询服务
pub trait ScatteringTable: Send + Sync {
    /// 表名（用于错误信息）
    fn name(&self) -> &'static str;

    /// 查询元素参数，元素符号已规范化
    fn params(&self, symbol: &str) -> Option<GaussianParams>;
}

/// X 射线散射因子
#[derive(Debug, Clone, Copy, Default)]
pub struct XrayTable;

/// 电子散射因子
#[derive(Debug, Clone, Copy, Default)]
pub struct ElectronTable;

impl ScatteringTable for XrayTable {
    fn name(&self) -> &'static str {
        "xray"
    }

    fn params(&self, symbol: &str) -> Option<GaussianParams> {
        XRAY.get(symbol).copied()
    }
}

impl ScatteringTable for ElectronTable {
    fn name(&self) -> &'static str {
        "electron"
    }

    fn params(&self, symbol: &str) -> Option<GaussianParams> {
        ELECTRON.get(symbol).copied()
    }
}

type Row = (&'static str, [f64; 4], [f64; 4], f64);

fn build(rows: &[Row]) -> HashMap<&'static str, GaussianParams> {
    rows.iter()
        .map(|(el, a, b, c)| (*el, GaussianParams { a: *a, b: *b, c: *c }))
        .collect()
}

static XRAY: LazyLock<HashMap<&'static str, GaussianParams>> = LazyLock::new(|| {
    build(&[
        ("H", [0.493002, 0.322912, 0.140191, 0.040810], [10.5109, 26.1257, 3.14236, 57.7997], 0.003038),
        ("He", [0.8734, 0.6309, 0.3112, 0.1780], [9.1037, 3.3568, 22.9276, 0.9821], 0.0064),
        ("Li", [1.1282, 0.7508, 0.6175, 0.4653], [3.9546, 1.0524, 85.3905, 168.261], 0.0377),
        ("Be", [1.5919, 1.1278, 0.5391, 0.7029], [43.6427, 1.8623, 103.483, 0.5420], 0.0385),
        ("B", [2.0545, 1.3326, 1.0979, 0.7068], [23.2185, 1.0210, 60.3498, 0.1403], -0.1932),
        ("C", [2.3100, 1.0200, 1.5886, 0.8650], [20.8439, 10.2075, 0.5687, 51.6512], 0.2156),
        ("N", [12.2126, 3.1322, 2.0125, 1.1663], [0.0057, 9.8933, 28.9975, 0.5826], -11.529),
        ("O", [3.0485, 2.2868, 1.5463, 0.8670], [13.2771, 5.7011, 0.3239, 32.9089], 0.2508),
        ("F", [3.5392, 2.6412, 1.5170, 1.0243], [10.2825, 4.2944, 0.2615, 26.1476], 0.2776),
        ("Na", [4.7626, 3.1736, 1.2674, 1.1128], [3.2850, 8.8422, 0.3136, 129.424], 0.6760),
        ("Mg", [5.4204, 2.1735, 1.2269, 2.3073], [2.8275, 79.2611, 0.3808, 7.1937], 0.8584),
        ("Al", [6.4202, 1.9002, 1.5936, 1.9646], [3.0387, 0.7426, 31.5472, 85.0886], 1.1151),
        ("Si", [6.2915, 3.0353, 1.9891, 1.5410], [2.4386, 32.3337, 0.6785, 81.6937], 1.1407),
        ("P", [6.4345, 4.1791, 1.7800, 1.4908], [1.9067, 27.1570, 0.5260, 68.1645], 1.1149),
        ("S", [6.9053, 5.2034, 1.4379, 1.5863], [1.4679, 22.2151, 0.2536, 56.1720], 0.8669),
        ("Cl", [11.4604, 7.1964, 6.2556, 1.6455], [0.0104, 1.1662, 18.5194, 47.7784], -9.5574),
        ("K", [8.2186, 7.4398, 1.0519, 0.8659], [12.7949, 0.7748, 213.187, 41.6841], 1.4228),
        ("Ca", [8.6266, 7.3873, 1.5899, 1.0211], [10.4421, 0.6599, 85.7484, 178.437], 1.3751),
        ("Ti", [9.7595, 7.3558, 1.6991, 1.9021], [7.8508, 0.5000, 35.6338, 116.105], 1.2807),
        ("V", [10.2971, 7.3511, 2.0703, 2.0571], [6.8657, 0.4385, 26.8938, 102.478], 1.2199),
        ("Cr", [10.6406, 7.3537, 3.3240, 1.4922], [6.1038, 0.3920, 20.2626, 98.7399], 1.1832),
        ("Mn", [11.2819, 7.3573, 3.0193, 2.2441], [5.3409, 0.3432, 17.8674, 83.7543], 1.0896),
        ("Fe", [11.7695, 7.3573, 3.5222, 2.3045], [4.7611, 0.3072, 15.3535, 76.8805], 1.0369),
        ("Co", [12.2841, 7.3409, 4.0034, 2.3488], [4.2791, 0.2784, 13.5359, 71.1692], 1.0118),
        ("Ni", [12.8376, 7.2920, 4.4438, 2.3800], [3.8785, 0.2565, 12.1763, 66.3421], 1.0341),
        ("Cu", [13.3380, 7.1676, 5.6158, 1.6735], [3.5828, 0.2470, 11.3966, 64.8126], 1.1910),
        ("Zn", [14.0743, 7.0318, 5.1652, 2.4100], [3.2655, 0.2333, 10.3163, 58.7097], 1.3041),
        ("Ga", [15.2354, 6.7006, 4.3591, 2.9623], [3.0669, 0.2412, 10.7805, 61.4135], 1.7189),
        ("Ge", [16.0816, 6.3747, 3.7068, 3.6830], [2.8509, 0.2516, 11.4468, 54.7625], 2.1313),
        ("As", [16.6723, 6.0701, 3.4313, 4.2779], [2.6345, 0.2647, 12.9479, 47.7972], 2.531),
        ("Se", [17.0006, 5.8196, 3.9731, 4.3543], [2.4098, 0.2726, 15.2372, 43.8163], 2.8409),
        ("Br", [17.1789, 5.2358, 5.6377, 3.9851], [2.1723, 16.5796, 0.2609, 41.4328], 2.9557),
        ("Rb", [17.5816, 7.6598, 5.8981, 2.7817], [1.7139, 14.7957, 0.1603, 31.2087], 2.0782),
        ("Sr", [17.5663, 9.8184, 5.4220, 2.6694], [1.5564, 14.0988, 0.1664, 132.376], 2.5064),
        ("Y", [17.7760, 10.2946, 5.7263, 3.2656], [1.4029, 12.8006, 0.1255, 104.354], 1.9341),
        ("Zr", [17.8765, 10.9480, 5.4173, 3.6577], [1.2761, 11.9160, 0.1176, 87.6627], 2.0690),
        ("Nb", [17.6142, 12.0144, 4.0418, 3.5334], [1.1886, 11.7660, 0.2047, 69.7957], 3.7553),
        ("Mo", [3.7025, 17.2356, 12.8876, 3.7429], [0.2772, 1.0958, 11.0040, 61.6584], 4.3875),
        ("Ag", [19.2808, 16.6885, 4.8045, 1.0463], [0.6446, 7.4726, 24.6605, 99.8156], 5.1790),
        ("Cs", [20.3892, 19.1062, 10.6620, 1.4953], [3.5690, 0.3107, 24.3879, 213.904], 3.3352),
        ("Ba", [20.3361, 19.2970, 10.8880, 2.6959], [3.2160, 0.2756, 20.2073, 167.202], 2.7731),
        ("La", [20.5780, 19.5990, 11.3727, 3.2879], [2.9480, 0.2440, 18.7726, 133.124], 2.1461),
        ("Ce", [21.1671, 19.7695, 11.8513, 3.3303], [2.8129, 0.2268, 17.6083, 127.113], 1.8623),
        ("Au", [16.8819, 18.5913, 25.5582, 5.8600], [0.4611, 8.6216, 1.4826, 36.3956], 12.0658),
        ("Pb", [31.0617, 13.0637, 18.4420, 5.9696], [0.6902, 2.3576, 8.6180, 47.2579], 13.4118),
        ("Bi", [33.3689, 12.9510, 16.5877, 6.4692], [0.7040, 2.9238, 8.7937, 48.0093], 13.5782),
    ])
});

static ELECTRON: LazyLock<HashMap<&'static str, GaussianParams>> = LazyLock::new(|| {
    build(&[
        ("H", [0.2020, 0.2440, 0.0820, 0.0000], [30.8680, 8.5440, 1.2730, 0.0000], 0.0),
        ("C", [0.7307, 1.1951, 0.4563, 0.1247], [36.9951, 11.2966, 2.8139, 0.3456], 0.0),
        ("N", [0.5717, 1.0425, 0.4647, 0.1307], [28.8465, 9.0542, 2.4213, 0.3167], 0.0),
        ("O", [0.4548, 0.9173, 0.4719, 0.1384], [23.7803, 7.6220, 2.1440, 0.2959], 0.0),
        ("Na", [2.2406, 1.3326, 0.9070, 0.2863], [108.0039, 24.5047, 3.3914, 0.4346], 0.0),
        ("Mg", [2.2692, 1.8025, 0.8394, 0.2892], [73.6704, 20.1749, 3.0181, 0.4046], 0.0),
        ("Al", [2.2756, 2.4280, 0.8578, 0.3166], [72.3220, 19.7729, 3.0799, 0.4076], 0.0),
        ("Si", [2.1293, 2.5333, 0.8349, 0.3216], [57.7748, 16.4756, 2.8796, 0.3860], 0.0),
        ("P", [1.8882, 2.4685, 0.8046, 0.3204], [44.8756, 13.5383, 2.6424, 0.3608], 0.0),
        ("S", [1.6591, 2.3863, 0.7899, 0.3208], [36.6500, 11.4881, 2.4686, 0.3403], 0.0),
        ("Cl", [1.4524, 2.2924, 0.7874, 0.3217], [30.9352, 9.9798, 2.2341, 0.3227], 0.0),
        ("K", [3.9507, 2.5452, 1.9795, 0.4817], [137.0748, 22.4023, 4.5319, 0.4338], 0.0),
        ("Ca", [4.4696, 2.9703, 1.9696, 0.4818], [99.5228, 22.6958, 4.1954, 0.4165], 0.0),
    ])
});

/// 共价半径 (Å) 与原子量
static ATOMIC_DATA: LazyLock<HashMap<&'static str, (f64, f64)>> = LazyLock::new(|| {
    [
        ("H", 0.32, 1.008),
        ("C", 0.77, 12.011),
        ("N", 0.70, 14.007),
        ("O", 0.66, 15.999),
        ("F", 0.64, 18.998),
        ("Na", 1.54, 22.990),
        ("Mg", 1.36, 24.305),
        ("Al", 1.18, 26.982),
        ("Si", 1.17, 28.086),
        ("P", 1.10, 30.974),
        ("S", 1.04, 32.065),
        ("Cl", 0.99, 35.453),
        ("K", 1.96, 39.098),
        ("Ca", 1.74, 40.078),
        ("Ti", 1.32, 47.867),
        ("Fe", 1.25, 55.845),
        ("Cu", 1.17, 63.546),
        ("Zn", 1.25, 65.38),
        ("Ge", 1.22, 72.64),
    ]
    .into_iter()
    .map(|(el, r, w)| (el, (r, w)))
    .collect()
});

/// 元素的 (共价半径, 原子量)
pub fn atomic_data(symbol: &str) -> Option<(f64, f64)> {
    ATOMIC_DATA.get(symbol).copied()
}

/// 从原子标签提取规范化元素符号："Si1" → "Si", "SI" → "Si", "o2" → "O"
pub fn element_symbol(label: &str) -> Option<String> {
    let letters: Vec<char> = label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();

    let first = letters.first()?.to_ascii_uppercase();
    let two = letters
        .get(1)
        .map(|c| format!("{}{}", first, c.to_ascii_lowercase()));

    // 先试两字母符号，再退回单字母
    match two {
        Some(sym) if XRAY.contains_key(sym.as_str()) || ATOMIC_DATA.contains_key(sym.as_str()) => {
            Some(sym)
        }
        _ => Some(first.to_string()),
    }
}
