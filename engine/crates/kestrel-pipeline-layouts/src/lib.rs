//! 管线布局脚本
//!
//! 把前向 / 延迟两套渲染管线的 descriptor 布局声明成布局层级，
//! 自底向上合并后发射给运行期布局图。脚本只依赖布局声明接口，
//! 不接触具体图形 API。
//!
//! # 模块结构
//!
//! - `bloom`: bloom 链共用的声明步骤
//! - `forward`: 前向管线布局
//! - `deferred`: 延迟管线布局

mod bloom;
mod deferred;
mod forward;

// Re-exports
pub use bloom::{BloomStep, MAX_BLOOM_FILTER_PASSES, add_bloom_chain, add_bloom_step};
pub use deferred::{TAA_STAGE_COUNT, build_deferred_layout};
pub use forward::build_forward_layout;
