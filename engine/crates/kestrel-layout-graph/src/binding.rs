//! shader 反射的绑定解析
//!
//! effect 资产里的反射记录写的是编译器给出的原始 binding，
//! 这里按布局图把它们改写成布局实际分配的位置：可见性取所在
//! block 的掩码，binding 取 block 在 set 内的起始偏移。
//!
//! 逐批次 / 逐实例的 set 由材质系统自行管理，解析时整组跳过；
//! stage、phase、程序任何一环找不到都静默跳过对应 pass。

use itertools::Itertools;
use kestrel_effect::{EffectAsset, PassPhase, ShaderInfo};
use kestrel_render_interface::UpdateFrequency;

use crate::compiled::{CompiledLayoutGraph, DescriptorBlockLayout, LayoutTable};
use crate::hierarchy::{DescriptorId, LgVertexHandle};

/// 由 pass 声明推导 phase 名
///
/// 三种写法：
/// - 数字 phase 转十进制字符串，`0` 也是合法 phase；
/// - 字符串 phase 原样使用；
/// - 未声明时落到 stage 的缺省 phase `"{stage}_"`。
pub fn derive_phase_name(stage_name: &str, phase: Option<&PassPhase>) -> String {
    match phase {
        Some(PassPhase::Index(n)) => n.to_string(),
        Some(PassPhase::Name(name)) => name.clone(),
        None => format!("{stage_name}_"),
    }
}

/// 按程序布局改写单个 shader 的反射记录
///
/// 布局里每个描述符按全图 id 与反射记录按名字对号，命中的记录
/// 被写入所在 block 的可见性与起始 binding；没有命中的记录保持
/// 原值。
pub fn rebind_shader(graph: &CompiledLayoutGraph, layout: &LayoutTable, shader: &mut ShaderInfo) {
    for (freq, set) in &layout.sets {
        if matches!(freq, UpdateFrequency::PerBatch | UpdateFrequency::PerInstance) {
            continue;
        }
        for block in &set.descriptor_blocks {
            for entry in &block.descriptors {
                apply_binding(graph, shader, entry.id, block);
            }
        }
    }
}

fn apply_binding(graph: &CompiledLayoutGraph, shader: &mut ShaderInfo, id: DescriptorId, block: &DescriptorBlockLayout) {
    for record in shader.resources_mut() {
        if graph.descriptor_id(record.name()) == Some(id) {
            record.rebind(block.visibility, block.offset);
        }
    }
}

/// 程序布局缺某个频率的 set 时，沿父链借用最近祖先的
///
/// bloom、TAA 这类 stage 把逐 pass 的 block 声明在 stage 顶点上，
/// phase 只挂程序；解析前把缺的频率从上层补进来。
fn inherited_layout(graph: &CompiledLayoutGraph, phase: LgVertexHandle, base: &LayoutTable) -> LayoutTable {
    let mut layout = base.clone();
    let mut cursor = graph.node(phase).map_or(LgVertexHandle::INVALID, |node| node.parent);
    while let Some(node) = graph.node(cursor) {
        for (freq, set) in &node.table.sets {
            if layout.set(*freq).is_none() {
                layout.sets.insert(*freq, set.clone());
            }
        }
        cursor = node.parent;
    }
    layout
}

/// 解析整个 effect 资产的绑定
///
/// 逐 technique、逐 pass 地找到 stage 下的 phase 与程序布局，
/// 改写资产中对应 shader 的反射记录。程序布局没有的频率沿层级
/// 向上取最近祖先的 set。
pub fn resolve_effect_bindings(graph: &CompiledLayoutGraph, stage_name: &str, asset: &mut EffectAsset) {
    let _span = tracy_client::Client::running()
        .map(|client| client.span(tracy_client::span_location!("binding resolve"), 0));

    let stage = graph.locate_child(LgVertexHandle::INVALID, stage_name);
    if !stage.is_valid() {
        log::trace!("binding resolve: stage \"{stage_name}\" not in layout graph, skipped");
        return;
    }

    // 先收集 pass 清单，之后才能可变遍历资产里的 shader
    let passes = asset
        .techniques
        .iter()
        .flat_map(|tech| &tech.passes)
        .map(|pass| (pass.program.clone(), derive_phase_name(stage_name, pass.phase.as_ref())))
        .collect_vec();

    for (program_name, phase_name) in passes {
        let phase = graph.locate_child(stage, &phase_name);
        if !phase.is_valid() {
            log::trace!("binding resolve: phase \"{phase_name}\" not under \"{stage_name}\", skipped");
            continue;
        }
        let Some(program) = graph.shader_program(phase, &program_name) else {
            log::trace!("binding resolve: program \"{program_name}\" not in phase \"{phase_name}\", skipped");
            continue;
        };
        let Some(shader) = asset.find_shader_mut(&program_name) else {
            log::trace!("binding resolve: shader \"{program_name}\" missing from asset, skipped");
            continue;
        };
        let layout = inherited_layout(graph, phase, &program.layout);
        rebind_shader(graph, &layout, shader);
    }
}
