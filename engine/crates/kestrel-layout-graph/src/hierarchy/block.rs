//! Descriptor block：布局聚合的基本单元
//!
//! block 由结构化 key（更新频率 / 参数类型 / 描述符类别 / 可见性）索引，
//! 内部的描述符与 uniform block 都按名字去重、按插入序排列。

use indexmap::IndexMap;
use kestrel_render_interface::{DescriptorTypeOrder, ParameterType, ResourceType, ShaderStageFlags, UpdateFrequency};

/// 单个具名描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub ty: ResourceType,
    /// 描述符数组长度，单个描述符为 1
    pub count: u32,
}

impl Descriptor {
    #[inline]
    pub fn new(ty: ResourceType) -> Self {
        Self { ty, count: 1 }
    }
}

/// uniform block 的单个成员
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub ty: ResourceType,
    /// 数组长度，标量为 1
    pub count: u32,
}

/// uniform block 定义：set/binding 坐标加有序成员列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockDef {
    pub set: u32,
    pub binding: u32,
    pub name: String,
    pub members: Vec<UniformMember>,
}

impl UniformBlockDef {
    pub fn new(set: u32, binding: u32, name: impl Into<String>) -> Self {
        Self {
            set,
            binding,
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// 追加或原地覆盖同名成员
    ///
    /// 成员保持首次插入的位置，重复设置只更新类型与数量。
    pub fn set_member(&mut self, name: &str, ty: ResourceType, count: u32) {
        if let Some(member) = self.members.iter_mut().find(|m| m.name == name) {
            member.ty = ty;
            member.count = count;
        } else {
            self.members.push(UniformMember {
                name: name.to_string(),
                ty,
                count,
            });
        }
    }
}

/// descriptor block 的结构化 key
///
/// 四个字段全部相同的声明才会落进同一个 block。
/// 可见性掩码是 key 的一部分：掩码不同的声明不会互相合并，
/// 写得不一致的可见性会把本该同组的描述符拆散（自检访问器会报告）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBlockIndex {
    pub update_frequency: UpdateFrequency,
    pub parameter_type: ParameterType,
    pub descriptor_type: DescriptorTypeOrder,
    pub visibility: ShaderStageFlags,
}

impl DescriptorBlockIndex {
    pub fn new(
        update_frequency: UpdateFrequency,
        parameter_type: ParameterType,
        descriptor_type: DescriptorTypeOrder,
        visibility: ShaderStageFlags,
    ) -> Self {
        Self {
            update_frequency,
            parameter_type,
            descriptor_type,
            visibility,
        }
    }
}

/// 聚合中的 descriptor block
///
/// `count` 是具名描述符的数量，`capacity` 是为 block 预留的槽位数，
/// 始终应满足 `capacity >= count`；capacity 为 0 的 block 不会被发射。
/// 通过 [`Self::set_descriptor`] 写入时计数是即时维护的；整块灌入的
/// 数据（例如全局默认组）要靠 [`Self::normalize`] 对齐。
#[derive(Debug, Clone, Default)]
pub struct DescriptorBlock {
    pub descriptors: IndexMap<String, Descriptor>,
    pub uniform_blocks: IndexMap<String, UniformBlockDef>,
    pub count: u32,
    pub capacity: u32,
}

impl DescriptorBlock {
    /// 按名字写入描述符
    ///
    /// 新名字追加到尾部并同步增加 count/capacity；
    /// 已有名字原地覆盖，位置与计数都不变。
    pub fn set_descriptor(&mut self, name: &str, ty: ResourceType) {
        if self.descriptors.insert(name.to_string(), Descriptor::new(ty)).is_none() {
            self.count += 1;
            self.capacity += 1;
        }
    }

    /// 归一化计数：count 对齐描述符数量，capacity 只增不减
    ///
    /// 幂等；手动抬高过的 capacity（预留槽位）不会被压缩。
    pub fn normalize(&mut self) {
        self.count = self.descriptors.len() as u32;
        self.capacity = self.capacity.max(self.count);
    }

    /// 并入另一个 block 的内容
    ///
    /// 描述符与 uniform block 都按名字覆盖（后写的赢），
    /// 新名字保持追加顺序；完成后重新归一化计数。
    pub fn merge_from(&mut self, other: &DescriptorBlock) {
        for (name, desc) in &other.descriptors {
            self.descriptors.insert(name.clone(), *desc);
        }
        for (name, ub) in &other.uniform_blocks {
            self.uniform_blocks.insert(name.clone(), ub.clone());
        }
        self.normalize();
    }
}

/// 一个布局顶点上的全部 descriptor block
#[derive(Debug, Clone, Default)]
pub struct DescriptorDb {
    pub blocks: IndexMap<DescriptorBlockIndex, DescriptorBlock>,
}

impl DescriptorDb {
    /// 按结构化 key 取得或创建 block
    pub fn block_mut(&mut self, index: DescriptorBlockIndex) -> &mut DescriptorBlock {
        self.blocks.entry(index).or_default()
    }

    #[inline]
    pub fn block(&self, index: &DescriptorBlockIndex) -> Option<&DescriptorBlock> {
        self.blocks.get(index)
    }

    /// 归一化所有 block 的计数
    pub fn normalize(&mut self) {
        for block in self.blocks.values_mut() {
            block.normalize();
        }
    }
}
