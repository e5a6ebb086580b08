use serde::{Deserialize, Serialize};

/// 描述符的更新频率
///
/// 数值顺序即描述符集的约定顺序：逐实例 < 逐批次 < 逐阶段 < 逐 pass。
/// 布局图按频率将 descriptor block 归入不同的 set。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum UpdateFrequency {
    PerInstance = 0,
    PerBatch = 1,
    PerPhase = 2,
    PerPass = 3,
}

/// 根签名参数类型
///
/// 布局图目前只在 descriptor table 路径上聚合资源；
/// push constant 走 `Constants`，不参与 block 合并。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ParameterType {
    Constants = 0,
    Table = 1,
}

/// 描述符类别
///
/// 作为 block key 的一部分参与聚合：类别不同的描述符永远
/// 落在不同的 block 里。set 内部 block 的排列只看声明顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum DescriptorTypeOrder {
    UniformBuffer = 0,
    DynamicUniformBuffer = 1,
    StorageBuffer = 2,
    DynamicStorageBuffer = 3,
    SamplerTexture = 4,
    Sampler = 5,
    Texture = 6,
    StorageImage = 7,
    InputAttachment = 8,
}

/// 着色器资源的数据类型
///
/// 既用于 uniform 成员（`Float4` 等），也用于描述符本身
/// （`Sampler2D` 等）；未知类型统一落在 `Unknown`。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ResourceType {
    #[default]
    Unknown = 0,
    Bool,
    Int,
    Int2,
    Int3,
    Int4,
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
    Sampler2D,
    Sampler2DArray,
    Sampler3D,
    SamplerCube,
    SubpassInput,
}

/// 描述符集槽位的固定分配
pub struct SetIndex;
impl SetIndex {
    pub const GLOBAL: u32 = 0;
    pub const MATERIAL: u32 = 1;
    pub const LOCAL: u32 = 2;
}
