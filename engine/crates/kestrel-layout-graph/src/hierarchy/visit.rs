//! 布局层级的深度优先遍历
//!
//! 颜色表与访问器都以 trait 形式暴露，校验、统计等工具以访问器的
//! 身份挂到同一套遍历上。层级按构建规则应当是森林，遍历中撞到
//! 灰色顶点说明内部状态已损坏，直接 panic。

use indexmap::IndexMap;
use kestrel_render_interface::UpdateFrequency;

use crate::hierarchy::graph::LayoutHierarchy;
use crate::hierarchy::handle::LgVertexHandle;

/// 遍历期间顶点的三色标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphColor {
    /// 尚未访问
    #[default]
    White,
    /// 已发现，子树未处理完
    Gray,
    /// 子树处理完毕
    Black,
}

/// 遍历使用的颜色存储
pub trait VertexColorMap {
    fn color(&self, vertex: LgVertexHandle) -> GraphColor;
    fn set_color(&mut self, vertex: LgVertexHandle, color: GraphColor);
}

/// 以顶点下标索引的颜色表
#[derive(Debug)]
pub struct VecColorMap {
    colors: Vec<GraphColor>,
}

impl VecColorMap {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            colors: vec![GraphColor::White; vertex_count],
        }
    }
}

impl VertexColorMap for VecColorMap {
    #[inline]
    fn color(&self, vertex: LgVertexHandle) -> GraphColor {
        self.colors[vertex.index()]
    }

    #[inline]
    fn set_color(&mut self, vertex: LgVertexHandle, color: GraphColor) {
        self.colors[vertex.index()] = color;
    }
}

/// 深度优先遍历的回调
///
/// 两个方法都有空默认实现，访问器只需覆写关心的时机。
pub trait LayoutVisitor {
    /// 顶点首次被发现（先于其子树）
    fn discover_vertex(&mut self, _vertex: LgVertexHandle, _graph: &LayoutHierarchy) {}

    /// 顶点的子树全部处理完毕
    fn finish_vertex(&mut self, _vertex: LgVertexHandle, _graph: &LayoutHierarchy) {}
}

/// 从所有根顶点出发做深度优先遍历
///
/// 根顶点与子顶点都按创建顺序访问。
///
/// # Panics
///
/// 层级中存在环时 panic。
pub fn depth_first_search<C, V>(graph: &LayoutHierarchy, colors: &mut C, visitor: &mut V)
where
    C: VertexColorMap,
    V: LayoutVisitor,
{
    for (root, vertex) in graph.iter() {
        if vertex.parent.is_valid() || colors.color(root) != GraphColor::White {
            continue;
        }

        colors.set_color(root, GraphColor::Gray);
        visitor.discover_vertex(root, graph);

        // 显式栈：(顶点, 下一个待访问的子顶点下标)
        let mut stack = vec![(root, 0_usize)];
        while let Some((v, next)) = stack.pop() {
            let children = graph.children(v);
            if next < children.len() {
                let child = children[next];
                stack.push((v, next + 1));
                match colors.color(child) {
                    GraphColor::White => {
                        colors.set_color(child, GraphColor::Gray);
                        visitor.discover_vertex(child, graph);
                        stack.push((child, 0));
                    }
                    GraphColor::Gray => panic!("layout hierarchy contains a cycle at {child:?}"),
                    GraphColor::Black => {}
                }
            } else {
                colors.set_color(v, GraphColor::Black);
                visitor.finish_vertex(v, graph);
            }
        }
    }
}

/// 声明一致性检查
///
/// 收集两类问题：block 容量小于计数；同一更新频率下的重名描述符。
/// 问题只记录不中断，调用方决定如何上报。
#[derive(Debug, Default)]
pub struct LayoutDiagnostics {
    pub findings: Vec<String>,
}

impl LayoutDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

impl LayoutVisitor for LayoutDiagnostics {
    fn discover_vertex(&mut self, vertex: LgVertexHandle, graph: &LayoutHierarchy) {
        let Some(v) = graph.vertex(vertex) else {
            return;
        };

        let mut seen: IndexMap<(UpdateFrequency, &str), u32> = IndexMap::new();
        for (index, block) in &v.descriptors.blocks {
            if block.capacity < block.count {
                self.findings.push(format!(
                    "\"{}\": block {:?} holds {} descriptors but only reserves capacity {}",
                    v.name, index.descriptor_type, block.count, block.capacity
                ));
            }
            for name in block.descriptors.keys() {
                *seen.entry((index.update_frequency, name.as_str())).or_default() += 1;
            }
        }

        for ((freq, name), occurrences) in &seen {
            if *occurrences > 1 {
                self.findings.push(format!(
                    "\"{}\": descriptor \"{name}\" declared {occurrences} times within {freq:?}",
                    v.name
                ));
            }
        }
    }
}
