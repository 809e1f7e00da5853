//! Extension taxonomy for the content library.
//!
//! Every classification the pipeline makes from a file name lives here:
//! which items get scanned for references, which carry identity markers,
//! which extensions a reference may legally point at, and which referenced
//! targets the dependency traversal is allowed to expand through.

/// Description files scanned line-by-line for embedded references.
pub const TEXT_ASSET_EXTENSIONS: &[&str] = &["json", "vap", "vaj"];

/// Items carrying a single identity marker (morph name or avatar uid).
pub const IDENTITY_EXTENSIONS: &[&str] = &["vmi", "vam"];

/// Extensions a package family token may reference, and the only extensions
/// the dependency traversal expands through (scene -> sub-scene -> preset
/// chains; consumed leaf assets never fan out).
pub const PRESET_LIKE_EXTENSIONS: &[&str] = &["json", "vap", "vaj", "vam"];

/// Full allow-list of asset extensions the reference scanner accepts.
pub const ASSET_EXTENSIONS: &[&str] = &[
    // Images / textures
    "jpg", "jpeg", "png", "tif", "tiff",
    // Audio
    "mp3", "ogg", "wav",
    // Unity bundles
    "assetbundle", "scene", "audiobundle",
    // Plugins
    "cs", "cslist", "dll",
    // Morphs
    "vmi", "vmb",
    // Clothing / hair
    "vam", "vaj", "vab",
    // Presets / scenes
    "vap", "json",
];

/// Audio extensions; subject to the raw-filename exclusion heuristic.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav"];

/// Image/texture extensions; the scanner accepts texture-ish keys for these.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// Directory prefixes that admit an item into the avatar-link (internal id)
/// identity index.
pub const AVATAR_LINK_PREFIXES: &[&str] = &["custom/clothing/", "custom/hair/"];

/// Gendered morph directory prefix, paired with its category.
const MORPH_GENDER_PREFIXES: &[(&str, MorphGender)] = &[
    (
        "custom/atom/person/morphs/female_genitalia/",
        MorphGender::FemaleGen,
    ),
    (
        "custom/atom/person/morphs/male_genitalia/",
        MorphGender::MaleGen,
    ),
    ("custom/atom/person/morphs/female/", MorphGender::Female),
    ("custom/atom/person/morphs/male/", MorphGender::Male),
];

/// Gender/category of a morph directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphGender {
    Female,
    Male,
    /// Female genitalia sub-category; cross-matches `Female` only.
    FemaleGen,
    /// Male genitalia sub-category; cross-matches `Male` only.
    MaleGen,
}

impl MorphGender {
    const fn base_is_female(self) -> bool {
        matches!(self, Self::Female | Self::FemaleGen)
    }

    /// Morphs never match across genders; a "gen" sub-category matches its
    /// own-gender base category in either direction.
    #[must_use]
    pub const fn compatible(self, other: Self) -> bool {
        self.base_is_female() == other.base_is_female()
    }
}

/// Lowercased trailing extension of a path-ish string, if any.
#[must_use]
pub fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[must_use]
pub fn is_text_asset_ext(ext: &str) -> bool {
    TEXT_ASSET_EXTENSIONS.iter().any(|e| *e == ext)
}

#[must_use]
pub fn is_identity_ext(ext: &str) -> bool {
    IDENTITY_EXTENSIONS.iter().any(|e| *e == ext)
}

#[must_use]
pub fn is_preset_like_ext(ext: &str) -> bool {
    PRESET_LIKE_EXTENSIONS.iter().any(|e| *e == ext)
}

#[must_use]
pub fn is_asset_ext(ext: &str) -> bool {
    ASSET_EXTENSIONS.iter().any(|e| *e == ext)
}

#[must_use]
pub fn is_audio_ext(ext: &str) -> bool {
    AUDIO_EXTENSIONS.iter().any(|e| *e == ext)
}

#[must_use]
pub fn is_image_ext(ext: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|e| *e == ext)
}

/// True if the library-relative path admits the item into the avatar-link
/// identity index.
#[must_use]
pub fn is_avatar_link_path(local_path: &str) -> bool {
    let lowered = local_path.to_ascii_lowercase();
    AVATAR_LINK_PREFIXES.iter().any(|p| lowered.starts_with(p))
}

/// Gender category of a morph path, when the path lives under a gendered
/// morph directory. Paths outside the known prefixes have no category and
/// are compatible with every candidate.
#[must_use]
pub fn morph_gender(local_path: &str) -> Option<MorphGender> {
    let lowered = local_path.to_ascii_lowercase();
    MORPH_GENDER_PREFIXES
        .iter()
        .find(|(prefix, _)| lowered.starts_with(prefix))
        .map(|(_, gender)| *gender)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_of_handles_paths_and_bare_names() {
        assert_eq!(extension_of("a/b/scene.json").as_deref(), Some("json"));
        assert_eq!(extension_of("SCENE.JSON").as_deref(), Some("json"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn preset_like_is_a_subset_of_assets() {
        for ext in PRESET_LIKE_EXTENSIONS {
            assert!(is_asset_ext(ext), "{ext} missing from allow-list");
        }
    }

    #[test]
    fn morph_gender_from_path() {
        assert_eq!(
            morph_gender("Custom/Atom/Person/Morphs/female/Shape.vmi"),
            Some(MorphGender::Female)
        );
        assert_eq!(
            morph_gender("Custom/Atom/Person/Morphs/male_genitalia/G.vmi"),
            Some(MorphGender::MaleGen)
        );
        assert_eq!(morph_gender("a/morph.vmi"), None);
    }

    #[test]
    fn gen_category_matches_own_gender_only() {
        assert!(MorphGender::Female.compatible(MorphGender::FemaleGen));
        assert!(MorphGender::FemaleGen.compatible(MorphGender::Female));
        assert!(MorphGender::Male.compatible(MorphGender::MaleGen));
        assert!(!MorphGender::Male.compatible(MorphGender::Female));
        assert!(!MorphGender::MaleGen.compatible(MorphGender::FemaleGen));
    }

    #[test]
    fn avatar_link_prefixes_are_case_insensitive() {
        assert!(is_avatar_link_path("Custom/Clothing/Female/Top/x.vam"));
        assert!(is_avatar_link_path("custom/hair/female/a.vam"));
        assert!(!is_avatar_link_path("Saves/scene/x.vam"));
    }
}
