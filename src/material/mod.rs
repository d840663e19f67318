//! Material descriptors referencing the atlas.
//!
//! Produces `.vmat` text for the `sky.vfx` and `csgo_moondome.vfx` shaders.
//! Nothing here touches the filesystem.

/// Default engine-relative folder for skybox materials.
pub const DEFAULT_MATERIAL_FOLDER: &str = "materials/skybox";

/// Which shader a descriptor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Sky,
    Moondome,
}

impl MaterialKind {
    pub fn shader_name(&self) -> &'static str {
        match self {
            MaterialKind::Sky => "sky.vfx",
            MaterialKind::Moondome => "csgo_moondome.vfx",
        }
    }

    fn file_prefix(&self) -> &'static str {
        match self {
            MaterialKind::Sky => "skybox",
            MaterialKind::Moondome => "moondome",
        }
    }

    /// Render the descriptor text for an atlas reference.
    pub fn render(&self, texture_reference: &str) -> String {
        match self {
            MaterialKind::Sky => SKY_TEMPLATE.replace(TEXTURE_PLACEHOLDER, texture_reference),
            MaterialKind::Moondome => {
                MOONDOME_TEMPLATE.replace(TEXTURE_PLACEHOLDER, texture_reference)
            }
        }
    }

    /// Descriptor file name for an atlas, e.g. `skybox_<atlas stem>.vmat`.
    pub fn file_name(&self, atlas_relative_path: &str) -> String {
        format!("{}_{}.vmat", self.file_prefix(), atlas_stem(atlas_relative_path))
    }
}

/// A rendered material descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialDescriptor {
    pub kind: MaterialKind,
    pub file_name: String,
    pub texture_reference: String,
    pub content: String,
}

impl MaterialDescriptor {
    pub fn new(kind: MaterialKind, atlas_relative_path: &str) -> Self {
        Self {
            kind,
            file_name: kind.file_name(atlas_relative_path),
            texture_reference: atlas_relative_path.to_string(),
            content: kind.render(atlas_relative_path),
        }
    }

    pub fn shader_name(&self) -> &'static str {
        self.kind.shader_name()
    }
}

/// Engine-relative reference `<folder>/<atlas file>` with forward slashes.
pub fn material_reference(folder: &str, atlas_file_name: &str) -> String {
    let folder = folder.replace('\\', "/");
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        atlas_file_name.to_string()
    } else {
        format!("{}/{}", folder, atlas_file_name)
    }
}

/// Emit zero, one or two descriptors as `(file name, content)` pairs.
pub fn emit(
    atlas_relative_path: &str,
    want_sky: bool,
    want_moondome: bool,
) -> Vec<(String, String)> {
    descriptors(atlas_relative_path, want_sky, want_moondome)
        .into_iter()
        .map(|d| (d.file_name, d.content))
        .collect()
}

/// Like [`emit`], keeping the descriptor metadata.
pub fn descriptors(
    atlas_relative_path: &str,
    want_sky: bool,
    want_moondome: bool,
) -> Vec<MaterialDescriptor> {
    let mut out = Vec::new();
    if want_sky {
        out.push(MaterialDescriptor::new(MaterialKind::Sky, atlas_relative_path));
    }
    if want_moondome {
        out.push(MaterialDescriptor::new(MaterialKind::Moondome, atlas_relative_path));
    }
    out
}

fn atlas_stem(atlas_relative_path: &str) -> &str {
    let file = atlas_relative_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(atlas_relative_path);
    match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    }
}

const TEXTURE_PLACEHOLDER: &str = "{texture}";

const SKY_TEMPLATE: &str = r#"// THIS FILE IS AUTO-GENERATED (STANDARD SKYBOX)

Layer0
{
    shader "sky.vfx"

    //---- Format ----
    F_TEXTURE_FORMAT2 1 // Dxt1 (LDR)

    //---- Texture ----
    g_flBrightnessExposureBias "0.000"
    g_flRenderOnlyExposureBias "0.000"
    SkyTexture "{texture}"


    VariableState
    {
        "Texture"
        {
        }
    }
}"#;

const MOONDOME_TEMPLATE: &str = r#"// THIS FILE IS AUTO-GENERATED (MOONDOME)

Layer0
{
    shader "csgo_moondome.vfx"

    //---- Color ----
    g_flTexCoordRotation "0.000"
    g_nScaleTexCoordUByModelScaleAxis "0" // None
    g_nScaleTexCoordVByModelScaleAxis "0" // None
    g_vColorTint "[1.000000 1.000000 1.000000 0.000000]"
    g_vTexCoordCenter "[0.500 0.500]"
    g_vTexCoordOffset "[0.000 0.000]"
    g_vTexCoordScale "[1.000 1.000]"
    g_vTexCoordScrollSpeed "[0.000 0.000]"
    TextureColor "[1.000000 1.000000 1.000000 0.000000]"

    //---- CubeParallax ----
    g_flCubeParallax "0.000"

    //---- Fog ----
    g_bFogEnabled "1"

    //---- Texture ----
    TextureCubeMap "{texture}"

    //---- Texture Address Mode ----
    g_nTextureAddressModeU "0" // Wrap
    g_nTextureAddressModeV "0" // Wrap


    VariableState
    {
        "Color"
        {
        }
        "CubeParallax"
        {
        }
        "Fog"
        {
        }
        "Texture"
        {
        }
        "Texture Address Mode"
        {
        }
    }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    const ATLAS: &str = "materials/skybox/skybox_cross.png";

    #[test]
    fn test_emit_none() {
        assert!(emit(ATLAS, false, false).is_empty());
    }

    #[test]
    fn test_emit_sky_only() {
        let out = emit(ATLAS, true, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "skybox_skybox_cross.vmat");
        assert!(out[0].1.contains(r#"shader "sky.vfx""#));
        assert!(out[0].1.contains(r#"SkyTexture "materials/skybox/skybox_cross.png""#));
        assert!(!out[0].1.contains(TEXTURE_PLACEHOLDER));
    }

    #[test]
    fn test_emit_both_in_order() {
        let out = descriptors(ATLAS, true, true);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, MaterialKind::Sky);
        assert_eq!(out[1].kind, MaterialKind::Moondome);
        assert_eq!(out[1].file_name, "moondome_skybox_cross.vmat");
        assert_eq!(out[1].shader_name(), "csgo_moondome.vfx");
        assert!(out[1]
            .content
            .contains(r#"TextureCubeMap "materials/skybox/skybox_cross.png""#));
    }

    #[test]
    fn test_sky_golden() {
        let expected = "// THIS FILE IS AUTO-GENERATED (STANDARD SKYBOX)\n\nLayer0\n{\n    shader \"sky.vfx\"\n\n    //---- Format ----\n    F_TEXTURE_FORMAT2 1 // Dxt1 (LDR)\n\n    //---- Texture ----\n    g_flBrightnessExposureBias \"0.000\"\n    g_flRenderOnlyExposureBias \"0.000\"\n    SkyTexture \"a/b.png\"\n\n\n    VariableState\n    {\n        \"Texture\"\n        {\n        }\n    }\n}";
        assert_eq!(MaterialKind::Sky.render("a/b.png"), expected);
    }

    #[test]
    fn test_material_reference() {
        assert_eq!(
            material_reference("materials/skybox", "sky_cross.png"),
            "materials/skybox/sky_cross.png"
        );
        assert_eq!(
            material_reference("materials\\skybox\\", "sky.png"),
            "materials/skybox/sky.png"
        );
        assert_eq!(material_reference("", "sky.png"), "sky.png");
    }

    #[test]
    fn test_atlas_stem() {
        assert_eq!(atlas_stem("materials/skybox/night.sky.png"), "night.sky");
        assert_eq!(atlas_stem("night"), "night");
        assert_eq!(atlas_stem("materials\\skybox\\day.png"), "day");
    }
}
