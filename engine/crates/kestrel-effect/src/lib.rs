//! Effect 资产模型
//!
//! effect 是一组 technique/pass 的组织，加上每个 shader 程序的反射数据。
//! 布局图构建完成后，绑定解析器会把最终的可见性与 binding 偏移
//! 写回这里的反射记录（见 [`shader_info::ShaderResource`]）。
//!
//! # 模块结构
//! - `asset`: EffectAsset / Technique / PassInfo 与 JSON 加载
//! - `shader_info`: 七类反射记录与 rebind 接口

pub mod asset;
pub mod shader_info;

// Re-exports
pub use asset::{EffectAsset, PassInfo, PassPhase, Technique};
pub use shader_info::{
    BlockInfo, BufferInfo, ImageInfo, SamplerInfo, SamplerTextureInfo, ShaderInfo, ShaderResource, SubpassInputInfo,
    TextureInfo, UniformInfo,
};
