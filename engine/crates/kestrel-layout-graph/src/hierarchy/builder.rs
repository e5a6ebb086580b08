//! 布局层级的声明接口
//!
//! 管线脚本通过这里声明 stage/phase、descriptor block 与 uniform，
//! 自底向上调用 [`DescriptorHierarchy::merge`] 把声明汇总到父顶点，
//! 最终交给发射器。所有查询失败都以哨兵句柄 / 静默忽略收场，
//! 只有内部不变量被破坏时才 panic。

use bitflags::bitflags;
use kestrel_effect::EffectAsset;
use kestrel_render_interface::{
    DescriptorTypeOrder, ParameterType, ResourceType, SetIndex, ShaderStageFlags, UpdateFrequency,
};

use crate::binding::derive_phase_name;
use crate::hierarchy::block::{Descriptor, DescriptorBlockIndex, UniformBlockDef};
use crate::hierarchy::graph::{LayoutHierarchy, RenderPhaseInfo, VertexTag};
use crate::hierarchy::handle::{LgBlockHandle, LgUniformHandle, LgVertexHandle};

bitflags! {
    /// 全局描述符组的开关
    ///
    /// 每一位对应全局 stage 顶点上的一组固定描述符，
    /// 见 [`DescriptorHierarchy::add_global`]。
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct GlobalLayoutFlags: u32 {
        const GLOBAL_UBO = 1 << 0;
        const CAMERA_UBO = 1 << 1;
        const SHADOW_UBO = 1 << 2;
        const SHADOW_MAP = 1 << 3;
        const ENVIRONMENT_MAP = 1 << 4;
        const DIFFUSE_LIGHTMAP = 1 << 5;
        const SKYBOX = 1 << 6;
        const REFLECTION_PROBE = 1 << 7;
        const ALL = Self::GLOBAL_UBO.bits()
            | Self::CAMERA_UBO.bits()
            | Self::SHADOW_UBO.bits()
            | Self::SHADOW_MAP.bits()
            | Self::ENVIRONMENT_MAP.bits()
            | Self::DIFFUSE_LIGHTMAP.bits()
            | Self::SKYBOX.bits()
            | Self::REFLECTION_PROBE.bits();
    }
}

/// 布局层级构建器
///
/// 持有构建期层级图；所有修改都经由这里的方法进行。
#[derive(Debug, Default)]
pub struct DescriptorHierarchy {
    pub graph: LayoutHierarchy,
}

// new & init
impl DescriptorHierarchy {
    /// 全局 uniform block 的固定 binding
    const GLOBAL_UBO_BINDING: u32 = 0;
    const CAMERA_UBO_BINDING: u32 = 1;
    const SHADOW_UBO_BINDING: u32 = 2;

    pub fn new() -> Self {
        Self::default()
    }
}

// 顶点声明
impl DescriptorHierarchy {
    /// 创建全局 stage 顶点，按 flags 挂载固定描述符组
    ///
    /// 描述符组整块写入后计数处于未对齐状态，这里会立即做一次
    /// [`Self::merge_descriptors`] 归一化。
    pub fn add_global(&mut self, name: &str, flags: GlobalLayoutFlags) -> LgVertexHandle {
        let vertex = self.graph.add_vertex(name, VertexTag::RenderStage { stage_id: 0 }, LgVertexHandle::INVALID);
        self.mount_global_groups(vertex, flags);
        self.merge_descriptors(vertex);
        log::debug!("layout: global stage \"{name}\" mounted with {flags:?}");
        vertex
    }

    /// 创建渲染阶段顶点
    ///
    /// `stage_id` 是上层管线自定义的阶段标识，布局本身不解释它。
    pub fn add_render_stage(&mut self, name: &str, stage_id: u32) -> LgVertexHandle {
        self.graph.add_vertex(name, VertexTag::RenderStage { stage_id }, LgVertexHandle::INVALID)
    }

    /// 在 stage 下创建 phase 顶点
    ///
    /// parent 无效或不是 stage 时返回 INVALID。
    pub fn add_render_phase(&mut self, name: &str, parent: LgVertexHandle) -> LgVertexHandle {
        match self.graph.vertex(parent) {
            Some(v) if matches!(v.tag, VertexTag::RenderStage { .. }) => {}
            _ => {
                log::warn!("add_render_phase(\"{name}\"): parent {parent:?} is not a valid render stage");
                return LgVertexHandle::INVALID;
            }
        }
        self.graph.add_vertex(name, VertexTag::RenderPhase(RenderPhaseInfo::default()), parent)
    }

    /// 在 phase 上注册 shader 程序名
    ///
    /// phase 无效时静默忽略；重复注册幂等。
    pub fn add_shader(&mut self, name: &str, phase: LgVertexHandle) {
        if let Some(vertex) = self.graph.vertex_mut(phase) {
            if let VertexTag::RenderPhase(info) = &mut vertex.tag {
                info.add_shader(name);
                return;
            }
        }
        log::trace!("add_shader(\"{name}\"): phase {phase:?} not found, ignored");
    }

    /// 按 effect 资产的 technique/pass 组织填充 stage 下的 phase
    ///
    /// 每个 pass 通过 [`derive_phase_name`] 得到 phase 名，不存在的
    /// phase 会被创建；pass 引用的 shader 程序登记到 phase 上，程序
    /// 反射出的 uniform block 与采样纹理声明为 phase 的逐批次 block。
    pub fn add_effect(&mut self, asset: &EffectAsset, stage: LgVertexHandle) {
        let Some(stage_vertex) = self.graph.vertex(stage) else {
            log::warn!("add_effect(\"{}\"): stage {stage:?} not found, ignored", asset.name);
            return;
        };
        let stage_name = stage_vertex.name.clone();

        for tech in &asset.techniques {
            for pass in &tech.passes {
                let phase_name = derive_phase_name(&stage_name, pass.phase.as_ref());
                let mut phase = self.graph.locate_child(stage, &phase_name);
                if !phase.is_valid() {
                    phase = self.add_render_phase(&phase_name, stage);
                }
                self.add_shader(&pass.program, phase);

                let Some(shader) = asset.find_shader(&pass.program) else {
                    continue;
                };

                if !shader.blocks.is_empty() {
                    let block = self.get_layout_block(
                        UpdateFrequency::PerBatch,
                        ParameterType::Table,
                        DescriptorTypeOrder::UniformBuffer,
                        ShaderStageFlags::ALL,
                        phase,
                    );
                    for block_info in &shader.blocks {
                        let ub = self.get_uniform_block(SetIndex::MATERIAL, block_info.binding, &block_info.name, block);
                        for member in &block_info.members {
                            self.set_uniform(ub, &member.name, member.ty, member.count);
                        }
                    }
                }

                if !shader.sampler_textures.is_empty() {
                    let block = self.get_layout_block(
                        UpdateFrequency::PerBatch,
                        ParameterType::Table,
                        DescriptorTypeOrder::SamplerTexture,
                        ShaderStageFlags::ALL,
                        phase,
                    );
                    for st in &shader.sampler_textures {
                        self.set_descriptor(block, &st.name, st.ty);
                    }
                }
            }
        }
    }
}

// block 与 uniform 声明
impl DescriptorHierarchy {
    /// 取得或创建顶点上的 descriptor block
    ///
    /// 这是创建 block 的唯一入口；四元组 key 相同的调用总是命中
    /// 同一个 block。顶点无效时返回无效句柄，后续写入静默失效。
    pub fn get_layout_block(
        &mut self,
        freq: UpdateFrequency,
        param: ParameterType,
        descriptor_type: DescriptorTypeOrder,
        visibility: ShaderStageFlags,
        vertex: LgVertexHandle,
    ) -> LgBlockHandle {
        let index = DescriptorBlockIndex::new(freq, param, descriptor_type, visibility);
        let Some(v) = self.graph.vertex_mut(vertex) else {
            return LgBlockHandle {
                vertex: LgVertexHandle::INVALID,
                index,
            };
        };
        v.descriptors.block_mut(index);
        LgBlockHandle { vertex, index }
    }

    /// 取得或创建 block 内的 uniform block
    ///
    /// 同名重复调用返回相同 slot。uniform block 自身也会在 block 里
    /// 登记一个同名的 Unknown 描述符，占一个槽位并参与绑定解析。
    pub fn get_uniform_block(&mut self, set: u32, binding: u32, name: &str, block: LgBlockHandle) -> LgUniformHandle {
        let Some(v) = self.graph.vertex_mut(block.vertex) else {
            return LgUniformHandle { block, slot: u32::MAX };
        };
        let b = v.descriptors.block_mut(block.index);

        let slot = match b.uniform_blocks.get_index_of(name) {
            Some(i) => i as u32,
            None => {
                b.uniform_blocks.insert(name.to_string(), UniformBlockDef::new(set, binding, name));
                (b.uniform_blocks.len() - 1) as u32
            }
        };
        b.set_descriptor(name, ResourceType::Unknown);
        LgUniformHandle { block, slot }
    }

    /// 向 block 写入一个具名描述符；句柄无效时静默忽略
    pub fn set_descriptor(&mut self, block: LgBlockHandle, name: &str, ty: ResourceType) {
        if let Some(v) = self.graph.vertex_mut(block.vertex) {
            v.descriptors.block_mut(block.index).set_descriptor(name, ty);
        }
    }

    /// 向 uniform block 写入（或覆盖）一个成员；句柄无效时静默忽略
    pub fn set_uniform(&mut self, handle: LgUniformHandle, name: &str, ty: ResourceType, count: u32) {
        let Some(v) = self.graph.vertex_mut(handle.block.vertex) else {
            return;
        };
        let b = v.descriptors.block_mut(handle.block.index);
        if let Some((_, ub)) = b.uniform_blocks.get_index_mut(handle.slot as usize) {
            ub.set_member(name, ty, count);
        }
    }
}

// 合并
impl DescriptorHierarchy {
    /// 把顶点的声明向上汇总到父顶点
    ///
    /// 先归一化自身，再按结构化 key 并入父顶点的同类 block
    /// （不存在则创建）；父顶点被触碰的 block 会重新归一化。
    /// 根顶点没有父顶点，等价于只做归一化。向上传播永远不会
    /// 自动发生，跨多级汇总需要调用方自底向上逐级 merge。
    pub fn merge(&mut self, vertex: LgVertexHandle) {
        self.merge_descriptors(vertex);

        let Some(v) = self.graph.vertex(vertex) else {
            return;
        };
        let parent = v.parent;
        if !parent.is_valid() {
            return;
        }

        // 快照子顶点的 DB，避免同时可变借用两个顶点
        let child_db = v.descriptors.clone();
        let Some(p) = self.graph.vertex_mut(parent) else {
            return;
        };
        for (index, block) in &child_db.blocks {
            p.descriptors.block_mut(*index).merge_from(block);
        }
        log::trace!("layout: merged {vertex:?} into {parent:?} ({} blocks)", child_db.blocks.len());
    }

    /// 归一化顶点上所有 block 的计数
    ///
    /// count 对齐描述符数量，capacity 只增不减；幂等，任何时刻
    /// 调用都安全。
    pub fn merge_descriptors(&mut self, vertex: LgVertexHandle) {
        if let Some(v) = self.graph.vertex_mut(vertex) {
            v.descriptors.normalize();
        }
    }
}

// 全局默认描述符组
impl DescriptorHierarchy {
    fn mount_global_groups(&mut self, vertex: LgVertexHandle, flags: GlobalLayoutFlags) {
        let Some(v) = self.graph.vertex_mut(vertex) else {
            return;
        };
        let db = &mut v.descriptors;

        let ubo_index = DescriptorBlockIndex::new(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::UniformBuffer,
            ShaderStageFlags::ALL,
        );
        let sampler_index = DescriptorBlockIndex::new(
            UpdateFrequency::PerPass,
            ParameterType::Table,
            DescriptorTypeOrder::SamplerTexture,
            ShaderStageFlags::FRAGMENT,
        );

        if flags.contains(GlobalLayoutFlags::GLOBAL_UBO) {
            let block = db.block_mut(ubo_index);
            block.descriptors.insert("GlobalUBO".to_string(), Descriptor::new(ResourceType::Unknown));
            let mut ub = UniformBlockDef::new(SetIndex::GLOBAL, Self::GLOBAL_UBO_BINDING, "GlobalUBO");
            ub.set_member("time", ResourceType::Float4, 1);
            ub.set_member("screenSize", ResourceType::Float4, 1);
            ub.set_member("nativeSize", ResourceType::Float4, 1);
            block.uniform_blocks.insert("GlobalUBO".to_string(), ub);
        }
        if flags.contains(GlobalLayoutFlags::CAMERA_UBO) {
            let block = db.block_mut(ubo_index);
            block.descriptors.insert("CameraUBO".to_string(), Descriptor::new(ResourceType::Unknown));
            let mut ub = UniformBlockDef::new(SetIndex::GLOBAL, Self::CAMERA_UBO_BINDING, "CameraUBO");
            ub.set_member("matView", ResourceType::Mat4, 1);
            ub.set_member("matProj", ResourceType::Mat4, 1);
            ub.set_member("matViewProj", ResourceType::Mat4, 1);
            ub.set_member("cameraPos", ResourceType::Float4, 1);
            ub.set_member("exposure", ResourceType::Float4, 1);
            block.uniform_blocks.insert("CameraUBO".to_string(), ub);
        }
        if flags.contains(GlobalLayoutFlags::SHADOW_UBO) {
            let block = db.block_mut(ubo_index);
            block.descriptors.insert("ShadowUBO".to_string(), Descriptor::new(ResourceType::Unknown));
            let mut ub = UniformBlockDef::new(SetIndex::GLOBAL, Self::SHADOW_UBO_BINDING, "ShadowUBO");
            ub.set_member("matLightView", ResourceType::Mat4, 1);
            ub.set_member("matLightViewProj", ResourceType::Mat4, 1);
            ub.set_member("shadowInfo", ResourceType::Float4, 1);
            ub.set_member("shadowColor", ResourceType::Float4, 1);
            block.uniform_blocks.insert("ShadowUBO".to_string(), ub);
        }

        if flags.contains(GlobalLayoutFlags::SHADOW_MAP) {
            db.block_mut(sampler_index)
                .descriptors
                .insert("shadowMap".to_string(), Descriptor::new(ResourceType::Sampler2D));
        }
        if flags.contains(GlobalLayoutFlags::ENVIRONMENT_MAP) {
            db.block_mut(sampler_index)
                .descriptors
                .insert("environmentMap".to_string(), Descriptor::new(ResourceType::SamplerCube));
        }
        if flags.contains(GlobalLayoutFlags::DIFFUSE_LIGHTMAP) {
            db.block_mut(sampler_index)
                .descriptors
                .insert("diffuseLightmap".to_string(), Descriptor::new(ResourceType::Sampler2D));
        }
        if flags.contains(GlobalLayoutFlags::SKYBOX) {
            db.block_mut(sampler_index)
                .descriptors
                .insert("skybox".to_string(), Descriptor::new(ResourceType::SamplerCube));
        }
        if flags.contains(GlobalLayoutFlags::REFLECTION_PROBE) {
            db.block_mut(sampler_index)
                .descriptors
                .insert("reflectionProbeMap".to_string(), Descriptor::new(ResourceType::SamplerCube));
        }
    }
}
