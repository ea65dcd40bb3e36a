//! Explicit field registry for every catalog table.
//!
//! # Responsibility
//! - Enumerate the frame table and every component table.
//! - Declare each table's columns, in declaration order, with semantic types.
//! - Name the primary-key subset of each table.
//!
//! # Invariants
//! - Column order is stable: it drives DDL, CSV templates and imports.
//! - Component tables start with the composite key, then the shared base
//!   fields, then the per-part fields.
//! - Table names are unique across `EntityKind::all()`.

use crate::model::field::{FieldDef, FieldType, TEXT_10, TEXT_20, TEXT_40};
use serde::Serialize;
use std::fmt::{Display, Formatter};

use FieldType::{Bool, Count, Date, Float2, FloatList, IntList, Map, Year};

/// Name of the frame primary-key column.
pub const FRAME_KEY_COLUMN: &str = "serial";

/// Columns forming the component composite key, in key order.
pub const COMPONENT_KEY_COLUMNS: [&str; 5] = [
    "frame_serial",
    "manufacturer",
    "component_group",
    "model_name",
    "stamped_codes",
];

const fn f(name: &'static str, ty: FieldType) -> FieldDef {
    FieldDef::new(name, ty)
}

const FRAME_FIELDS: &[FieldDef] = &[
    f("serial", TEXT_20),
    f("serial_location", TEXT_20),
    f("brand", TEXT_20),
    f("model_year", Year),
    f("model_name", TEXT_20),
    f("material_manufacturer", TEXT_20),
    f("material_tier", TEXT_20),
    f("dropout_manufacturer", TEXT_20),
    f("dropout_type", TEXT_20),
    f("dropout_model", TEXT_20),
    f("lug_manufacturer", TEXT_20),
    f("lug_set", TEXT_20),
    f("braze_ons", Map),
    f("seat_tube_c2c_cm", Float2),
    f("seat_tube_diameter_mm", Float2),
    f("seat_tube_int_diameter_mm", Float2),
    f("seat_tube_wall_thickness", FloatList),
    f("seat_tube_features", Map),
    f("top_tube_c2c_cm", Float2),
    f("top_tube_diameter_mm", Float2),
    f("top_tube_wall_thickness", FloatList),
    f("top_tube_features", Map),
    f("head_tube_c2c_cm", Float2),
    f("head_tube_diameter_mm", Float2),
    f("head_tube_int_diameter_mm", Float2),
    f("head_tube_wall_thickness", FloatList),
    f("head_tube_features", Map),
    f("down_tube_c2c_cm", Float2),
    f("down_tube_diameter_mm", Float2),
    f("down_tube_wall_thickness", FloatList),
    f("down_tube_features", Map),
    f("seat_stays_e2e_cm", Float2),
    f("seat_stay_diameter_mm", Float2),
    f("seat_stay_wall_thickness", FloatList),
    f("seat_stay_features", Map),
    f("chain_stays_e2e_cm", Float2),
    f("chain_stay_diameter_mm", Float2),
    f("chain_stay_wall_thickness", FloatList),
    f("chain_stay_features", Map),
    f("production_year", Year),
    f("manufacturer", TEXT_20),
    f("stamped_codes", Map),
    f("style", TEXT_20),
    f("features", Map),
    f("material", Map),
    f("weight_spec_g", Float2),
    f("weight_actual_g", Float2),
    f("purchase_date", Date),
    f("purchase_price", Float2),
    f("value_low_usd", Float2),
    f("value_avg_usd", Float2),
    f("value_high_usd", Float2),
];

const COMPONENT_KEY_FIELDS: &[FieldDef] = &[
    f("frame_serial", TEXT_20),
    f("manufacturer", TEXT_20),
    f("component_group", TEXT_20),
    f("model_name", TEXT_20),
    f("stamped_codes", Map),
];

const COMPONENT_BASE_FIELDS: &[FieldDef] = &[
    f("production_year", Year),
    f("style", TEXT_20),
    f("features", Map),
    f("material", Map),
    f("weight_spec_g", Float2),
    f("weight_actual_g", Float2),
    f("purchase_date", Date),
    f("purchase_price", Float2),
    f("value_low_usd", Float2),
    f("value_avg_usd", Float2),
    f("value_high_usd", Float2),
];

const FORK_FIELDS: &[FieldDef] = &[
    f("material_tier", TEXT_20),
    f("crown_type", TEXT_20),
    f("dropout_manufacturer", TEXT_20),
    f("dropout_type", TEXT_20),
    f("steerer_length_mm", Float2),
    f("threaded_length_mm", Float2),
    f("blade_length_mm", Float2),
    f("crown_width_mm", Float2),
    f("spacing_mm", Float2),
    f("offset_rake", Float2),
    f("trail", TEXT_20),
];

const SEATPOST_FIELDS: &[FieldDef] = &[
    f("length_mm", Float2),
    f("diameter_mm", Float2),
    f("clamp_type", TEXT_20),
];

const SADDLE_FIELDS: &[FieldDef] = &[
    f("rail_material", TEXT_10),
    f("base_material", TEXT_10),
    f("cushion_material", TEXT_10),
    f("dimensions_lwh_cm", IntList),
];

const STEM_FIELDS: &[FieldDef] = &[
    f("quill_style", TEXT_20),
    f("height_mm", Float2),
    f("reach_mm", Float2),
    f("quill_diameter_mm", Float2),
    f("steerer_diameter_mm", Float2),
    f("clamp_diameter", Float2),
];

const HANDLEBARS_FIELDS: &[FieldDef] = &[
    f("dimensions", Map),
    f("clamping_diameter", Float2),
    f("bar_diameter", Float2),
];

const BRAKE_LEVERS_FIELDS: &[FieldDef] = &[
    f("bar_type", TEXT_20),
    f("clamp_size", Float2),
    f("lever_color", TEXT_10),
    f("hood_color", TEXT_10),
];

const BRAKES_FIELDS: &[FieldDef] = &[
    f("brake_type", TEXT_20),
    f("mount_type", TEXT_20),
    f("reach_mm", Float2),
    f("pad_type", TEXT_20),
    f("position", TEXT_10),
];

const SHIFTERS_FIELDS: &[FieldDef] = &[
    f("shifter_type", TEXT_20),
    f("mount_type", TEXT_20),
    f("speed_qty", Count),
    f("indexed", Bool),
];

const DERAILLEUR_FRONT_FIELDS: &[FieldDef] = &[
    f("capacity", Count),
    f("mount_type", TEXT_20),
    f("clamp_diameter_mm", Float2),
    f("cage_type", TEXT_10),
];

const DERAILLEUR_REAR_FIELDS: &[FieldDef] = &[
    f("capacity", Count),
    f("mount_type", TEXT_20),
    f("cage_type", TEXT_10),
    f("sprocket_diameter_mm", Float2),
    f("sprocket_tooth_qty", Count),
    f("sprocket_bearing_type", TEXT_20),
];

const CRANKSET_FIELDS: &[FieldDef] = &[
    f("arm_length_mm", Float2),
    f("bb_type", TEXT_20),
    f("spindle_type", TEXT_20),
    f("chainring_bolt_qty", Count),
    f("bolt_circle_diameter", Float2),
    f("chainring_qty", Count),
    f("pedal_thread", TEXT_10),
];

const CHAINRING_FIELDS: &[FieldDef] = &[
    f("tooth_qty", Count),
    f("bolt_circle_diameter", Float2),
    f("bolt_qty", Count),
    f("position", TEXT_10),
];

const PEDAL_FIELDS: &[FieldDef] = &[f("toe_clips", Bool), f("clip_cleat_type", TEXT_20)];

const FREEWHEEL_CASSETTE_FIELDS: &[FieldDef] = &[
    f("gear_qty", Count),
    f("low_teeth", Count),
    f("high_teeth", Count),
];

const BOTTOM_BRACKET_FIELDS: &[FieldDef] = &[
    f("threading", TEXT_10),
    f("bearing_type", TEXT_20),
    f("spindle_material", TEXT_20),
    f("spindle_length_mm", Float2),
    f("crank_mount_type", TEXT_20),
];

const HUB_FIELDS: &[FieldDef] = &[
    f("spacing_mm", Float2),
    f("axle_type", TEXT_20),
    f("bearing_type", TEXT_20),
    f("spoke_qty", Count),
    f("flange_diameter_mm", Float2),
    f("hub_position", TEXT_10),
];

const RIM_FIELDS: &[FieldDef] = &[
    f("nominal_size", TEXT_20),
    f("internal_diameter_mm", Float2),
    f("external_diameter_mm", Float2),
    f("tire_mount_type", TEXT_20),
    f("spoke_qty", Count),
    f("valve_type", TEXT_10),
    f("internal_width_mm", Float2),
    f("external_width_mm", Float2),
];

const HEADSET_FIELDS: &[FieldDef] = &[
    f("threading", TEXT_10),
    f("bearing_type", TEXT_20),
    f("internal_diameter_mm", Count),
    f("external_diameter_mm", Count),
];

const OTHER_FIELDS: &[FieldDef] = &[
    f("component_type", TEXT_20),
    f("description", TEXT_40),
    f("specs", Map),
];

/// Every replaceable part type that attaches to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ComponentKind {
    #[serde(rename = "fork")]
    Fork,
    #[serde(rename = "seatpost")]
    SeatPost,
    #[serde(rename = "saddle")]
    Saddle,
    #[serde(rename = "stem")]
    Stem,
    #[serde(rename = "handlebars")]
    HandleBars,
    #[serde(rename = "brake_levers")]
    BrakeLevers,
    #[serde(rename = "brakes")]
    Brakes,
    #[serde(rename = "shifters")]
    Shifters,
    #[serde(rename = "front_derailleur")]
    DerailleurFront,
    #[serde(rename = "rear_derailleur")]
    DerailleurRear,
    #[serde(rename = "crankset")]
    Crankset,
    #[serde(rename = "chainring")]
    ChainRing,
    #[serde(rename = "pedal")]
    Pedal,
    #[serde(rename = "freewheel_cassette")]
    FreewheelCasette,
    #[serde(rename = "bottom_bracket")]
    BottomBracket,
    #[serde(rename = "hub")]
    Hub,
    #[serde(rename = "rim")]
    Rim,
    #[serde(rename = "headset")]
    HeadSet,
    #[serde(rename = "other_component")]
    Other,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 19] = [
        Self::Fork,
        Self::SeatPost,
        Self::Saddle,
        Self::Stem,
        Self::HandleBars,
        Self::BrakeLevers,
        Self::Brakes,
        Self::Shifters,
        Self::DerailleurFront,
        Self::DerailleurRear,
        Self::Crankset,
        Self::ChainRing,
        Self::Pedal,
        Self::FreewheelCasette,
        Self::BottomBracket,
        Self::Hub,
        Self::Rim,
        Self::HeadSet,
        Self::Other,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Fork => "fork",
            Self::SeatPost => "seatpost",
            Self::Saddle => "saddle",
            Self::Stem => "stem",
            Self::HandleBars => "handlebars",
            Self::BrakeLevers => "brake_levers",
            Self::Brakes => "brakes",
            Self::Shifters => "shifters",
            Self::DerailleurFront => "front_derailleur",
            Self::DerailleurRear => "rear_derailleur",
            Self::Crankset => "crankset",
            Self::ChainRing => "chainring",
            Self::Pedal => "pedal",
            Self::FreewheelCasette => "freewheel_cassette",
            Self::BottomBracket => "bottom_bracket",
            Self::Hub => "hub",
            Self::Rim => "rim",
            Self::HeadSet => "headset",
            Self::Other => "other_component",
        }
    }

    pub fn from_table_name(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.table_name() == value)
    }

    /// Fields specific to this part type, excluding key and base fields.
    pub fn specific_fields(self) -> &'static [FieldDef] {
        match self {
            Self::Fork => FORK_FIELDS,
            Self::SeatPost => SEATPOST_FIELDS,
            Self::Saddle => SADDLE_FIELDS,
            Self::Stem => STEM_FIELDS,
            Self::HandleBars => HANDLEBARS_FIELDS,
            Self::BrakeLevers => BRAKE_LEVERS_FIELDS,
            Self::Brakes => BRAKES_FIELDS,
            Self::Shifters => SHIFTERS_FIELDS,
            Self::DerailleurFront => DERAILLEUR_FRONT_FIELDS,
            Self::DerailleurRear => DERAILLEUR_REAR_FIELDS,
            Self::Crankset => CRANKSET_FIELDS,
            Self::ChainRing => CHAINRING_FIELDS,
            Self::Pedal => PEDAL_FIELDS,
            Self::FreewheelCasette => FREEWHEEL_CASSETTE_FIELDS,
            Self::BottomBracket => BOTTOM_BRACKET_FIELDS,
            Self::Hub => HUB_FIELDS,
            Self::Rim => RIM_FIELDS,
            Self::HeadSet => HEADSET_FIELDS,
            Self::Other => OTHER_FIELDS,
        }
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Any catalog table: the root frame table or one component table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Frame,
    Component(ComponentKind),
}

impl EntityKind {
    /// Returns every table kind, frame first, then components in registry order.
    pub fn all() -> Vec<EntityKind> {
        std::iter::once(Self::Frame)
            .chain(ComponentKind::ALL.into_iter().map(Self::Component))
            .collect()
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::Component(kind) => kind.table_name(),
        }
    }

    pub fn from_table_name(value: &str) -> Option<Self> {
        if value == "frame" {
            return Some(Self::Frame);
        }
        ComponentKind::from_table_name(value).map(Self::Component)
    }

    /// Declared columns in declaration order.
    pub fn columns(self) -> Vec<FieldDef> {
        match self {
            Self::Frame => FRAME_FIELDS.to_vec(),
            Self::Component(kind) => COMPONENT_KEY_FIELDS
                .iter()
                .chain(COMPONENT_BASE_FIELDS)
                .chain(kind.specific_fields())
                .copied()
                .collect(),
        }
    }

    /// Primary-key column names, in key order.
    pub fn key_columns(self) -> &'static [&'static str] {
        match self {
            Self::Frame => &[FRAME_KEY_COLUMN],
            Self::Component(_) => &COMPONENT_KEY_COLUMNS,
        }
    }

    /// Looks up a declared column by name.
    pub fn field(self, name: &str) -> Option<FieldDef> {
        self.columns().into_iter().find(|field| field.name == name)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

#[cfg(test)]
mod tests {
    use super::{ComponentKind, EntityKind, COMPONENT_KEY_COLUMNS};
    use std::collections::HashSet;

    #[test]
    fn table_names_are_unique_and_reversible() {
        let kinds = EntityKind::all();
        let names: HashSet<_> = kinds.iter().map(|kind| kind.table_name()).collect();
        assert_eq!(names.len(), kinds.len());

        for kind in kinds {
            assert_eq!(EntityKind::from_table_name(kind.table_name()), Some(kind));
        }
        assert_eq!(EntityKind::from_table_name("bike"), None);
    }

    #[test]
    fn column_names_are_unique_per_table() {
        for kind in EntityKind::all() {
            let columns = kind.columns();
            let names: HashSet<_> = columns.iter().map(|field| field.name).collect();
            assert_eq!(names.len(), columns.len(), "duplicate column in {kind}");
        }
    }

    #[test]
    fn component_columns_start_with_composite_key() {
        let columns = EntityKind::Component(ComponentKind::Hub).columns();
        let leading: Vec<_> = columns.iter().take(5).map(|field| field.name).collect();
        assert_eq!(leading, COMPONENT_KEY_COLUMNS);
        assert_eq!(columns.last().map(|field| field.name), Some("hub_position"));
    }

    #[test]
    fn frame_key_is_serial() {
        assert_eq!(EntityKind::Frame.key_columns(), ["serial"]);
        assert_eq!(EntityKind::Frame.columns()[0].name, "serial");
    }

    #[test]
    fn component_kind_serializes_as_table_name() {
        for kind in ComponentKind::ALL {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::from(kind.table_name())
            );
        }
    }
}
