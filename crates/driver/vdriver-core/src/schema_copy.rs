//! Copy a host attribute's schema into an independent [`ProxySchema`].

use vdriver_api_core::{
    AttributeDescriptor, ChangeHook, ProxySchema, ProxyValue, SchemaFacets, SchemaOptions,
    ValueKind,
};

fn to_i32(v: f64) -> i32 {
    // `as` saturates and maps NaN to 0
    v as i32
}

/// Build a schema of the same kind, bounds and enum items as `descriptor`,
/// wired to `on_change`. `None` for kinds a proxy cannot hold and for enums
/// without items.
///
/// The default is not taken from the host: it is the kind's neutral value
/// (false, 0, first enum item, no flags) clamped into the hard range.
pub fn copy_schema(descriptor: &AttributeDescriptor, on_change: ChangeHook) -> Option<ProxySchema> {
    let kind = descriptor.kind.value_kind()?;
    let range = &descriptor.range;

    let (facets, default) = match kind {
        ValueKind::Bool => (SchemaFacets::Bool, ProxyValue::Bool(false)),
        ValueKind::Int => {
            let (hard_min, hard_max) = (to_i32(range.hard_min), to_i32(range.hard_max));
            let facets = SchemaFacets::Int {
                hard_min,
                hard_max,
                soft_min: to_i32(range.soft_min),
                soft_max: to_i32(range.soft_max),
                step: to_i32(range.step),
            };
            let default = if hard_min <= hard_max {
                0.clamp(hard_min, hard_max)
            } else {
                0
            };
            (facets, ProxyValue::Int(default))
        }
        ValueKind::Float => {
            let (hard_min, hard_max) = (range.hard_min as f32, range.hard_max as f32);
            let facets = SchemaFacets::Float {
                hard_min,
                hard_max,
                soft_min: range.soft_min as f32,
                soft_max: range.soft_max as f32,
                step: range.step as f32,
                precision: range.precision,
            };
            let default = if hard_min <= hard_max {
                0.0f32.clamp(hard_min, hard_max)
            } else {
                0.0
            };
            (facets, ProxyValue::Float(default))
        }
        ValueKind::Enum => {
            let first = descriptor.enum_items.first()?;
            let default = if descriptor.is_enum_flag {
                ProxyValue::EnumFlags(Vec::new())
            } else {
                ProxyValue::Enum(first.identifier.clone())
            };
            (
                SchemaFacets::Enum {
                    items: descriptor.enum_items.clone(),
                },
                default,
            )
        }
    };

    let flags = &descriptor.flags;
    Some(ProxySchema {
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        options: SchemaOptions {
            hidden: flags.hidden,
            skip_save: flags.skip_save,
            animatable: flags.animatable,
            library_editable: flags.library_editable,
            enum_flag: kind == ValueKind::Enum && descriptor.is_enum_flag,
        },
        overridable: flags.overridable,
        facets,
        default,
        on_change,
    })
}
