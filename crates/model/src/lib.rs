//! # Content Model
//!
//! Entity model for the content library index: versioned packages, loose
//! files, text assets and their references, all owned by one arena per scan
//! run.
//!
//! ```text
//! Library (arena)
//!     │
//!     ├──> ContentPackage ──> PackageEntry (ContentItem)
//!     ├──> LooseFile (ContentItem)
//!     │        └─> composite children + named gaps
//!     └──> LibraryIndex (families, paths, identity markers)
//! ```

mod extensions;
mod grouping;
mod index;
mod item;
mod library;
mod package_name;
mod paths;

pub use extensions::{
    extension_of, is_asset_ext, is_audio_ext, is_avatar_link_path, is_identity_ext,
    is_image_ext, is_preset_like_ext, is_text_asset_ext, morph_gender, MorphGender,
    ASSET_EXTENSIONS, AUDIO_EXTENSIONS, AVATAR_LINK_PREFIXES, IDENTITY_EXTENSIONS,
    IMAGE_EXTENSIONS, PRESET_LIKE_EXTENSIONS, TEXT_ASSET_EXTENSIONS,
};
pub use grouping::{group_composites, SiblingClass, SIBLING_CLASSES};
pub use index::LibraryIndex;
pub use item::{
    ContentItem, ContentPackage, ItemId, MissingReference, PackageId, Reference, ResolvedReference,
};
pub use library::Library;
pub use package_name::{NameError, PackageName, VersionToken};
pub use paths::{join_normalized, lookup_key, normalize, parent_dir};
