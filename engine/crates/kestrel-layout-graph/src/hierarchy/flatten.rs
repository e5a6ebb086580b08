//! block 的平行数组投影
//!
//! 发射接口不关心映射结构，只消费按插入序排列的平行数组。

use crate::hierarchy::block::{Descriptor, DescriptorBlock, UniformBlockDef};

/// 展平后的 descriptor block
///
/// 名字数组与数据数组一一对应，顺序与 block 内的插入序完全一致，
/// 从不重排；count/capacity 原样拷贝，不做任何归一化。
#[derive(Debug, Clone, Default)]
pub struct DescriptorBlockFlattened {
    pub descriptor_names: Vec<String>,
    pub descriptors: Vec<Descriptor>,
    pub uniform_block_names: Vec<String>,
    pub uniform_blocks: Vec<UniformBlockDef>,
    pub count: u32,
    pub capacity: u32,
}

impl DescriptorBlock {
    /// 展平成发射用的平行数组
    pub fn flatten(&self) -> DescriptorBlockFlattened {
        DescriptorBlockFlattened {
            descriptor_names: self.descriptors.keys().cloned().collect(),
            descriptors: self.descriptors.values().copied().collect(),
            uniform_block_names: self.uniform_blocks.keys().cloned().collect(),
            uniform_blocks: self.uniform_blocks.values().cloned().collect(),
            count: self.count,
            capacity: self.capacity,
        }
    }
}
