use kestrel_render_interface::{ResourceType, ShaderStageFlags};
use serde::{Deserialize, Serialize};

fn default_count() -> u32 {
    1
}

/// uniform block 的单个成员
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformInfo {
    pub name: String,

    #[serde(rename = "type", default)]
    pub ty: ResourceType,

    /// 数组长度，标量为 1
    #[serde(default = "default_count")]
    pub count: u32,
}

/// uniform block 反射记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub name: String,

    #[serde(default)]
    pub binding: u32,

    /// 由绑定解析写入，不参与序列化
    #[serde(skip)]
    pub stage_flags: ShaderStageFlags,

    #[serde(default)]
    pub members: Vec<UniformInfo>,
}

/// storage buffer 反射记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferInfo {
    pub name: String,

    #[serde(default)]
    pub binding: u32,

    #[serde(skip)]
    pub stage_flags: ShaderStageFlags,

    #[serde(default = "default_count")]
    pub member_count: u32,
}

/// storage image 反射记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    pub name: String,

    #[serde(default)]
    pub binding: u32,

    #[serde(skip)]
    pub stage_flags: ShaderStageFlags,

    #[serde(rename = "type", default)]
    pub ty: ResourceType,

    #[serde(default = "default_count")]
    pub count: u32,
}

/// combined image sampler 反射记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerTextureInfo {
    pub name: String,

    #[serde(default)]
    pub binding: u32,

    #[serde(skip)]
    pub stage_flags: ShaderStageFlags,

    #[serde(rename = "type", default)]
    pub ty: ResourceType,

    #[serde(default = "default_count")]
    pub count: u32,
}

/// 独立 sampler 反射记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerInfo {
    pub name: String,

    #[serde(default)]
    pub binding: u32,

    #[serde(skip)]
    pub stage_flags: ShaderStageFlags,

    #[serde(default = "default_count")]
    pub count: u32,
}

/// 独立 texture 反射记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureInfo {
    pub name: String,

    #[serde(default)]
    pub binding: u32,

    #[serde(skip)]
    pub stage_flags: ShaderStageFlags,

    #[serde(rename = "type", default)]
    pub ty: ResourceType,

    #[serde(default = "default_count")]
    pub count: u32,
}

/// subpass input 反射记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubpassInputInfo {
    pub name: String,

    #[serde(default)]
    pub binding: u32,

    #[serde(skip)]
    pub stage_flags: ShaderStageFlags,

    #[serde(default = "default_count")]
    pub count: u32,
}

/// 单个 shader 程序的反射数据
///
/// 七类资源各自一张列表；绑定解析会原地改写每条记录的
/// `stage_flags` 与 `binding`，没有匹配到的记录保持原值。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShaderInfo {
    pub name: String,

    #[serde(default)]
    pub blocks: Vec<BlockInfo>,
    #[serde(default)]
    pub buffers: Vec<BufferInfo>,
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    #[serde(default)]
    pub sampler_textures: Vec<SamplerTextureInfo>,
    #[serde(default)]
    pub samplers: Vec<SamplerInfo>,
    #[serde(default)]
    pub textures: Vec<TextureInfo>,
    #[serde(default)]
    pub subpass_inputs: Vec<SubpassInputInfo>,
}

impl ShaderInfo {
    /// 以统一接口遍历全部七类反射记录
    pub fn resources_mut(&mut self) -> impl Iterator<Item = &mut dyn ShaderResource> {
        self.blocks
            .iter_mut()
            .map(|r| r as &mut dyn ShaderResource)
            .chain(self.buffers.iter_mut().map(|r| r as &mut dyn ShaderResource))
            .chain(self.images.iter_mut().map(|r| r as &mut dyn ShaderResource))
            .chain(self.sampler_textures.iter_mut().map(|r| r as &mut dyn ShaderResource))
            .chain(self.samplers.iter_mut().map(|r| r as &mut dyn ShaderResource))
            .chain(self.textures.iter_mut().map(|r| r as &mut dyn ShaderResource))
            .chain(self.subpass_inputs.iter_mut().map(|r| r as &mut dyn ShaderResource))
    }
}

/// 能被布局图重新绑定的反射记录
///
/// 解析器按名字匹配到描述符后，把所在 block 的可见性与偏移写回记录。
pub trait ShaderResource {
    fn name(&self) -> &str;
    fn rebind(&mut self, visibility: ShaderStageFlags, binding: u32);
}

macro_rules! impl_shader_resource {
    ($($record:ty),+ $(,)?) => {
        $(
            impl ShaderResource for $record {
                #[inline]
                fn name(&self) -> &str {
                    &self.name
                }

                #[inline]
                fn rebind(&mut self, visibility: ShaderStageFlags, binding: u32) {
                    self.stage_flags = visibility;
                    self.binding = binding;
                }
            }
        )+
    };
}

impl_shader_resource!(
    BlockInfo,
    BufferInfo,
    ImageInfo,
    SamplerTextureInfo,
    SamplerInfo,
    TextureInfo,
    SubpassInputInfo,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebind_writes_through_trait() {
        let mut shader = ShaderInfo {
            name: "blit".to_string(),
            sampler_textures: vec![SamplerTextureInfo {
                name: "inputTexture".to_string(),
                binding: 0,
                stage_flags: ShaderStageFlags::default(),
                ty: ResourceType::Sampler2D,
                count: 1,
            }],
            ..Default::default()
        };

        for res in shader.resources_mut() {
            if res.name() == "inputTexture" {
                res.rebind(ShaderStageFlags::FRAGMENT, 5);
            }
        }

        assert_eq!(shader.sampler_textures[0].binding, 5);
        assert_eq!(shader.sampler_textures[0].stage_flags, ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn test_resources_mut_covers_all_lists() {
        let mut shader = ShaderInfo {
            name: "s".to_string(),
            blocks: vec![BlockInfo {
                name: "b".to_string(),
                binding: 0,
                stage_flags: ShaderStageFlags::default(),
                members: vec![],
            }],
            buffers: vec![BufferInfo {
                name: "sb".to_string(),
                binding: 0,
                stage_flags: ShaderStageFlags::default(),
                member_count: 1,
            }],
            subpass_inputs: vec![SubpassInputInfo {
                name: "si".to_string(),
                binding: 0,
                stage_flags: ShaderStageFlags::default(),
                count: 1,
            }],
            ..Default::default()
        };

        assert_eq!(shader.resources_mut().count(), 3);
    }
}
