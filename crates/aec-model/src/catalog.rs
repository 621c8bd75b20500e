//! Static knowledge about product fields, LCA modules, and units.
//!
//! Everything here is read-only process-wide data.

/// Identifier column of a product; forced to the first table position.
pub const IDENTIFIER_COLUMN: &str = "unique_product_uuid_v2";
/// Prefix of every LCA / environmental column.
pub const MATERIAL_FACTS: &str = "material_facts";
pub const DECLARED_UNIT: &str = "declared_unit";
pub const SCALING_FACTORS: &str = "scaling_factors";
/// Column added by statistics: whether the row's scaling factor is estimated.
pub const ESTIMATED_COLUMN: &str = "estimated";
/// Suffix marking a per-value estimated flag, e.g. `recycled_content_estimated`.
pub const ESTIMATED_SUFFIX: &str = "_estimated";
pub const DEFAULT_GROUPING_FIELD: &str = "product_type";

pub const LCA_FIELDS_INPUT: &[&str] = &[
    "net_fresh_water_use",
    "non_renewable_primary_energy",
    "non_renewable_primary_energy_raw_materials",
    "non_renewable_secondary_fuels",
    "renewable_primary_energy",
    "renewable_primary_energy_raw_materials",
    "renewable_secondary_fuels",
    "secondary_material_use",
    "total_non_renewable_primary_energy",
    "total_renewable_primary_energy",
];

pub const LCA_FIELDS_OUTPUT: &[&str] = &[
    "components_for_reuse",
    "exported_electrical_energy",
    "exported_thermal_energy",
    "hazardous_waste_disposed",
    "materials_for_energy_recovery",
    "materials_for_recycling",
    "non_hazardous_waste_disposed",
    "radioactive_waste_disposed",
];

pub const LCA_FIELDS_IMPACT: &[&str] = &[
    "abiotic_depletion_potential_fossil",
    "abiotic_depletion_potential_non_fossil",
    "acidification_potential",
    "ozone_depletion_potential",
    "eutrophication_potential",
    "formation_potential_of_tropospheric_ozone",
    "global_warming_potential_fossil",
    "global_warming_potential_biogenic",
    "global_warming_potential_luluc",
    "water_deprivation_potential",
];

pub const LCA_MODULES: &[&str] = &[
    "A1", "A2", "A3", "A1A2A3", "A4", "A5", "B1", "B2", "B3", "B4", "B5", "B6", "B7", "C1", "C2",
    "C3", "C4", "D",
];

/// Numeric material-fact fields, scaled together with the LCA columns.
pub const MF_NUM_FIELDS: &[&str] = &[
    "on_site_installation",
    "use_and_maintenance",
    "water_use_kg",
    "odp",
    "total_co2e_kg_mf",
    "total_co2e_kg_mf_corrected",
    "total_biogenic_co2e",
    "total_biogenic_co2e_corrected",
    "manufacturing",
    "manufacturing_corrected",
    "end_of_life",
    "end_of_life_corrected",
];

/// Material-fact fields expressed as percentages; never rescaled.
pub const MF_PERC_FIELDS: &[&str] = &[
    "recycled_content",
    "recyclable_content",
    "reuse_potential",
    "energy_recovery_possibility",
];

/// Physical property linking each pair of units.
pub const UNIT_TO_FIELD: &[((&str, &str), &str)] = &[
    (("kg", "m3"), "density"),
    (("kg", "m2"), "grammage"),
    (("kg", "m"), "linear_density"),
    (("kg", "piece"), "mass_per_piece"),
    (("m3", "m2"), "thickness"),
    (("m3", "m"), "cross_sectional_area"),
];

pub const PHYSICAL_PROPERTIES_FIELDS: &[&str] = &[
    "density",
    "grammage",
    "linear_density",
    "mass_per_piece",
    "thickness",
    "cross_sectional_area",
];

/// Primary unit → every unit of the same dimension.
pub const UNIT_CATEGORIES: &[(&str, &[&str])] = &[
    ("m", &["m", "ft", "in"]),
    ("m2", &["m2", "ft2", "in2"]),
    ("m3", &["m3", "ft3", "in3"]),
    ("kg", &["kg", "lb", "mt", "ust"]),
    ("piece", &["piece"]),
];

/// Fields offered as groupings by `available_groupings`.
pub const GROUPING_FIELDS: &[&str] = &[
    "material_type",
    "material_type_family",
    "product_type",
    "product_type_family",
    "manufacturing_continent",
    "material_facts.data_source",
    "company",
];

pub const EPDX_FORMAT_VERSION: &str = "1.2.0";
pub const EPDX_SOURCE: &str = "2050 Materials Product Database";
pub const EPDX_UNKNOWN: &str = "UNKNOWN";

/// Declared units with an EPDx unit code, in conversion order.
pub const EPDX_UNITS: &[(&str, &str)] = &[
    ("m", "M"),
    ("m2", "M2"),
    ("m3", "M3"),
    ("kg", "KG"),
    ("piece", "PCS"),
];

pub const EPDX_SUBTYPES: &[(&str, &str)] = &[
    ("Specific Dataset", "Specific"),
    ("Average Dataset", "Generic"),
    ("Representative Dataset", "Representative"),
    ("Generic Dataset", "Generic"),
    ("Template Dataset", "UNKNOWN"),
];

/// LCA modules with an EPDx module key. A1, A2 and A3 are only exported
/// through their aggregate.
pub const EPDX_MODULES: &[(&str, &str)] = &[
    ("A1A2A3", "a1a3"),
    ("A4", "a4"),
    ("A5", "a5"),
    ("B1", "b1"),
    ("B2", "b2"),
    ("B3", "b3"),
    ("B4", "b4"),
    ("B5", "b5"),
    ("B6", "b6"),
    ("B7", "b7"),
    ("C1", "c1"),
    ("C2", "c2"),
    ("C3", "c3"),
    ("C4", "c4"),
    ("D", "d"),
];

/// LCA field → EPDx impact category; `None` for fields EPDx has no slot for.
pub const EPDX_LCA_FIELDS: &[(&str, Option<&str>)] = &[
    ("net_fresh_water_use", Some("fw")),
    ("non_renewable_primary_energy", Some("penre")),
    ("non_renewable_primary_energy_raw_materials", Some("penrm")),
    ("non_renewable_secondary_fuels", Some("nrsf")),
    ("renewable_primary_energy", Some("pere")),
    ("renewable_primary_energy_raw_materials", Some("perm")),
    ("renewable_secondary_fuels", Some("rsf")),
    ("secondary_material_use", Some("sm")),
    ("total_non_renewable_primary_energy", Some("penrt")),
    ("total_renewable_primary_energy", Some("pert")),
    ("components_for_reuse", Some("cru")),
    ("exported_electrical_energy", Some("eee")),
    ("exported_thermal_energy", Some("eet")),
    ("hazardous_waste_disposed", Some("hwd")),
    ("materials_for_energy_recovery", Some("mer")),
    ("materials_for_recycling", Some("mfr")),
    ("non_hazardous_waste_disposed", Some("nhwd")),
    ("radioactive_waste_disposed", Some("rwd")),
    ("abiotic_depletion_potential_fossil", Some("adpf")),
    ("abiotic_depletion_potential_non_fossil", Some("adpe")),
    ("acidification_potential", Some("ap")),
    ("ozone_depletion_potential", Some("odp")),
    ("eutrophication_potential", Some("ep")),
    ("formation_potential_of_tropospheric_ozone", Some("pocp")),
    ("global_warming_potential_fossil", Some("gwp")),
    ("global_warming_potential_biogenic", None),
    ("global_warming_potential_luluc", None),
    ("water_deprivation_potential", None),
];

/// All LCA fields: input, output, then impact.
pub fn lca_fields() -> impl Iterator<Item = &'static str> {
    LCA_FIELDS_INPUT
        .iter()
        .chain(LCA_FIELDS_OUTPUT)
        .chain(LCA_FIELDS_IMPACT)
        .copied()
}

pub fn primary_units() -> impl Iterator<Item = &'static str> {
    UNIT_CATEGORIES.iter().map(|(primary, _)| *primary)
}

pub fn unit_categories() -> &'static [(&'static str, &'static [&'static str])] {
    UNIT_CATEGORIES
}

pub fn mf_num_fields() -> &'static [&'static str] {
    MF_NUM_FIELDS
}

pub fn mf_perc_fields() -> &'static [&'static str] {
    MF_PERC_FIELDS
}

pub fn physical_properties_fields() -> &'static [&'static str] {
    PHYSICAL_PROPERTIES_FIELDS
}

/// Primary unit whose category contains `unit`.
pub fn unit_category(unit: &str) -> Option<&'static str> {
    UNIT_CATEGORIES
        .iter()
        .find(|(_, members)| members.iter().any(|member| *member == unit))
        .map(|(primary, _)| *primary)
}

/// Physical property relating two units, in either order.
pub fn physical_property_for_units(a: &str, b: &str) -> Option<&'static str> {
    UNIT_TO_FIELD
        .iter()
        .find(|((x, y), _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, field)| *field)
}

/// `material_facts.<field>`
pub fn material_fact_column(field: &str) -> String {
    format!("{MATERIAL_FACTS}.{field}")
}

/// `material_facts.<field>.<module>` for every field × module pair.
pub fn lca_field_columns<F, M>(fields: &[F], modules: &[M]) -> Vec<String>
where
    F: AsRef<str>,
    M: AsRef<str>,
{
    fields
        .iter()
        .flat_map(|field| {
            modules.iter().map(move |module| {
                format!("{MATERIAL_FACTS}.{}.{}", field.as_ref(), module.as_ref())
            })
        })
        .collect()
}

/// Every LCA field × module column.
pub fn all_lca_columns() -> Vec<String> {
    let fields: Vec<&str> = lca_fields().collect();
    lca_field_columns(&fields, LCA_MODULES)
}

/// Columns rescaled by unit conversion: LCA field × module plus numeric
/// material facts.
pub fn scalable_columns() -> Vec<String> {
    let mut columns = all_lca_columns();
    columns.extend(MF_NUM_FIELDS.iter().map(|field| material_fact_column(field)));
    columns
}

pub fn scaling_factors_prefix() -> String {
    format!("{MATERIAL_FACTS}.{SCALING_FACTORS}.")
}

/// `material_facts.scaling_factors.<unit>.value`
pub fn scaling_value_column(unit: &str) -> String {
    format!("{MATERIAL_FACTS}.{SCALING_FACTORS}.{unit}.value")
}

/// `material_facts.scaling_factors.<unit>.estimated`
pub fn scaling_estimated_column(unit: &str) -> String {
    format!("{MATERIAL_FACTS}.{SCALING_FACTORS}.{unit}.estimated")
}

pub fn epdx_unit(unit: &str) -> Option<&'static str> {
    EPDX_UNITS
        .iter()
        .find(|(from, _)| *from == unit)
        .map(|(_, to)| *to)
}

pub fn epdx_subtype(subtype: &str) -> Option<&'static str> {
    EPDX_SUBTYPES
        .iter()
        .find(|(from, _)| *from == subtype)
        .map(|(_, to)| *to)
}
