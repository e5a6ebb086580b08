//! Bloom 链的布局声明
//!
//! prefilter → N 次降采样 → N 次升采样 → combine。
//! 每一步都是独立的 render stage，下挂一个空的 `"Queue"` phase；
//! BloomUBO 和这一步要采样的纹理都声明在 stage 顶点上。

use itertools::chain;
use kestrel_layout_graph::{DescriptorHierarchy, LgVertexHandle};
use kestrel_render_interface::{
    DescriptorTypeOrder, ParameterType, ResourceType, SetIndex, ShaderStageFlags, UpdateFrequency,
};

/// 降采样 / 升采样的最大级数
pub const MAX_BLOOM_FILTER_PASSES: u32 = 6;

/// bloom 链中的一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloomStep {
    Prefilter,
    Downsample(u32),
    Upsample(u32),
    Combine,
}

impl BloomStep {
    pub fn stage_name(&self) -> String {
        match self {
            BloomStep::Prefilter => "Bloom_Prefilter".to_string(),
            BloomStep::Downsample(i) => format!("Bloom_Downsample{i}"),
            BloomStep::Upsample(i) => format!("Bloom_Upsample{i}"),
            BloomStep::Combine => "Bloom_Combine".to_string(),
        }
    }

    /// 这一步要采样的纹理
    fn input_textures(&self) -> &'static [&'static str] {
        match self {
            BloomStep::Prefilter => &["outputResultMap"],
            BloomStep::Downsample(_) => &["bloomTexture"],
            BloomStep::Upsample(_) | BloomStep::Combine => &["outputResultMap", "bloomTexture"],
        }
    }
}

/// 声明 bloom 链的一步，返回新建的 stage 顶点
pub fn add_bloom_step(h: &mut DescriptorHierarchy, step: BloomStep, stage_id: u32) -> LgVertexHandle {
    let stage = h.add_render_stage(&step.stage_name(), stage_id);
    h.add_render_phase("Queue", stage);

    let ubos = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::UniformBuffer,
        ShaderStageFlags::ALL,
        stage,
    );
    let ubo = h.get_uniform_block(SetIndex::MATERIAL, 0, "BloomUBO", ubos);
    h.set_uniform(ubo, "texSize", ResourceType::Float4, 1);

    let samplers = h.get_layout_block(
        UpdateFrequency::PerPass,
        ParameterType::Table,
        DescriptorTypeOrder::SamplerTexture,
        ShaderStageFlags::FRAGMENT,
        stage,
    );
    for name in step.input_textures() {
        h.set_descriptor(samplers, name, ResourceType::Sampler2D);
    }

    h.merge(stage);
    stage
}

/// 依次声明完整的 bloom 链，返回下一个可用的 stage id
///
/// 级数超过 [`MAX_BLOOM_FILTER_PASSES`] 时取上限。
pub fn add_bloom_chain(h: &mut DescriptorHierarchy, filter_passes: u32, first_stage_id: u32) -> u32 {
    let passes = filter_passes.min(MAX_BLOOM_FILTER_PASSES);
    let steps = chain!(
        std::iter::once(BloomStep::Prefilter),
        (0..passes).map(BloomStep::Downsample),
        (0..passes).map(BloomStep::Upsample),
        std::iter::once(BloomStep::Combine),
    );

    let mut stage_id = first_stage_id;
    for step in steps {
        add_bloom_step(h, step, stage_id);
        stage_id += 1;
    }
    stage_id
}
