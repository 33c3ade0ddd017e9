//! Catalogue of host ID-block kinds a driver root can be picked from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! id_types {
    ($($variant:ident => ($ident:literal, $label:literal, $icon:literal, $code:literal),)*) => {
        /// Kind of ID-block the live block's root picker is restricted to.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum IdType {
            $(#[serde(rename = $ident)] $variant,)*
        }

        impl IdType {
            pub const ALL: &'static [IdType] = &[$(IdType::$variant,)*];

            /// Upper-case identifier (`"OBJECT"`, `"LIGHT_PROBE"`, ...).
            pub fn identifier(self) -> &'static str {
                match self { $(IdType::$variant => $ident,)* }
            }

            pub fn label(self) -> &'static str {
                match self { $(IdType::$variant => $label,)* }
            }

            pub fn icon(self) -> &'static str {
                match self { $(IdType::$variant => $icon,)* }
            }

            /// Numeric code the host uses for this ID kind.
            pub fn code(self) -> i32 {
                match self { $(IdType::$variant => $code,)* }
            }

            pub fn from_code(code: i32) -> Option<IdType> {
                IdType::ALL.iter().copied().find(|t| t.code() == code)
            }
        }
    };
}

id_types! {
    Action => ("ACTION", "Action", "ACTION", 17217),
    Armature => ("ARMATURE", "Armature", "ARMATURE_DATA", 21057),
    Brush => ("BRUSH", "Brush", "BRUSH_DATA", 21058),
    Camera => ("CAMERA", "Camera", "CAMERA_DATA", 16707),
    CacheFile => ("CACHEFILE", "Cache File", "FILE", 17987),
    Curve => ("CURVE", "Curve", "CURVE_DATA", 21827),
    Font => ("FONT", "Font", "FONT_DATA", 18006),
    GreasePencil => ("GREASEPENCIL", "Grease Pencil", "GREASEPENCIL", 17479),
    Collection => ("COLLECTION", "Collection", "OUTLINER_COLLECTION", 21063),
    Image => ("IMAGE", "Image", "IMAGE_DATA", 19785),
    Key => ("KEY", "Key", "SHAPEKEY_DATA", 17739),
    Light => ("LIGHT", "Light", "LIGHT_DATA", 16716),
    Library => ("LIBRARY", "Library", "LIBRARY_DATA_DIRECT", 18764),
    LineStyle => ("LINESTYLE", "Line Style", "LINE_DATA", 21324),
    Lattice => ("LATTICE", "Lattice", "LATTICE_DATA", 21580),
    Mask => ("MASK", "Mask", "MOD_MASK", 21325),
    Material => ("MATERIAL", "Material", "MATERIAL_DATA", 16717),
    Meta => ("META", "Metaball", "META_DATA", 16973),
    Mesh => ("MESH", "Mesh", "MESH_DATA", 17741),
    MovieClip => ("MOVIECLIP", "Movie Clip", "TRACKER", 17229),
    NodeTree => ("NODETREE", "Node Tree", "NODETREE", 21582),
    Object => ("OBJECT", "Object", "OBJECT_DATA", 16975),
    PaintCurve => ("PAINTCURVE", "Paint Curve", "CURVE_BEZCURVE", 17232),
    Palette => ("PALETTE", "Palette", "COLOR", 19536),
    Particle => ("PARTICLE", "Particle", "PARTICLE_DATA", 16720),
    LightProbe => ("LIGHT_PROBE", "Light Probe", "LIGHTPROBE_CUBEMAP", 20556),
    Scene => ("SCENE", "Scene", "SCENE_DATA", 17235),
    Simulation => ("SIMULATION", "Simulation", "PHYSICS", 18771),
    Sound => ("SOUND", "Sound", "SOUND", 20307),
    Speaker => ("SPEAKER", "Speaker", "SPEAKER", 19283),
    Text => ("TEXT", "Text", "TEXT", 22612),
    Texture => ("TEXTURE", "Texture", "TEXTURE_DATA", 17748),
    Hair => ("HAIR", "Hair", "HAIR_DATA", 16712),
    PointCloud => ("POINTCLOUD", "Point Cloud", "POINTCLOUD_DATA", 21584),
    Volume => ("VOLUME", "Volume", "VOLUME_DATA", 20310),
    WindowManager => ("WINDOWMANAGER", "Window Manager", "WINDOW", 19799),
    World => ("WORLD", "World", "WORLD_DATA", 20311),
    Workspace => ("WORKSPACE", "Workspace", "WORKSPACE", 21335),
}

impl Default for IdType {
    fn default() -> Self {
        IdType::Object
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown id type '{0}'")]
pub struct UnknownIdType(pub String);

impl FromStr for IdType {
    type Err = UnknownIdType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdType::ALL
            .iter()
            .copied()
            .find(|t| t.identifier() == s)
            .ok_or_else(|| UnknownIdType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_roundtrip() {
        for t in IdType::ALL {
            assert_eq!(t.identifier().parse::<IdType>(), Ok(*t));
            assert_eq!(IdType::from_code(t.code()), Some(*t));
        }
        assert_eq!(IdType::ALL.len(), 38);
        assert!("SPACESHIP".parse::<IdType>().is_err());
    }

    #[test]
    fn serde_uses_host_identifiers() {
        assert_eq!(
            serde_json::to_string(&IdType::LightProbe).unwrap(),
            r#""LIGHT_PROBE""#
        );
        let t: IdType = serde_json::from_str(r#""OBJECT""#).unwrap();
        assert_eq!(t, IdType::default());
        assert_eq!(IdType::Scene.code(), 17235);
        assert_eq!(IdType::Scene.label(), "Scene");
    }
}
