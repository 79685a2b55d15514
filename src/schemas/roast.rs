use super::optional_field;
use crate::{
    schema_registry::{RegistryError, TypeRegistry},
    type_description::TypeDescription,
};

/// Root of a roast telemetry record
pub const ROOT: &str = "RoastData";

const NUMBER_FIELDS: &[&str] = &[
    "beanChargeTemperature",
    "beanDropTemperature",
    "drumChargeTemperature",
    "drumDropTemperature",
];

const SERIES_FIELDS: &[&str] = &[
    "beanTemperature",
    "drumTemperature",
    "beanDerivative",
    "ibtsDerivative",
    "exitTemperature",
];

const COUNTER_FIELDS: &[&str] = &[
    "preheatTemperature",
    "roastStartIndex",
    "roastEndIndex",
    "totalRoastTime",
    "indexFirstCrackStart",
    "indexFirstCrackEnd",
    "indexSecondCrackStart",
    "indexSecondCrackEnd",
    "indexYellowingStart",
];

/// Build the registry for roast telemetry records
pub fn registry() -> Result<TypeRegistry, RegistryError> {
    let number = TypeDescription::number;
    let string = TypeDescription::string;

    let mut roast_fields = Vec::new();
    roast_fields.extend(NUMBER_FIELDS.iter().map(|name| optional_field(name, number())));
    roast_fields.extend(
        SERIES_FIELDS
            .iter()
            .map(|name| optional_field(name, TypeDescription::array_of(number()))),
    );
    roast_fields.extend(COUNTER_FIELDS.iter().map(|name| optional_field(name, number())));
    roast_fields.extend([
        // Scale readings arrive as text
        optional_field("weightGreen", string()),
        optional_field("weightRoasted", string()),
        optional_field("roastNumber", number()),
        optional_field("sampleRate", number()),
        optional_field("serialNumber", number()),
        optional_field("hardware", number()),
        optional_field("IRSensor", number()),
        optional_field("firmware", number()),
        optional_field("actions", TypeDescription::reference("Actions")),
        optional_field("missingSeconds", TypeDescription::array_of(TypeDescription::any())),
        optional_field("rorPreheat", number()),
        optional_field("uid", string()),
        optional_field("userId", string()),
        optional_field("dateTime", number()),
        optional_field("softwareVersion", string()),
        optional_field("firmwareVersion", number()),
        optional_field("roastName", string()),
        optional_field("ambient", number()),
        optional_field("humidity", number()),
        optional_field("beanId", string()),
        optional_field("updatedAt", number()),
        optional_field("roastDegree", number()),
        optional_field("guid", string()),
        optional_field("isPrivate", number()),
    ]);

    TypeRegistry::builder()
        .add_type(ROOT, TypeDescription::object(roast_fields, None))
        .add_type(
            "Actions",
            TypeDescription::object(
                vec![
                    optional_field(
                        "actionTempList",
                        TypeDescription::array_of(TypeDescription::any()),
                    ),
                    optional_field(
                        "actionTimeList",
                        TypeDescription::array_of(TypeDescription::reference("ActionTimeList")),
                    ),
                ],
                None,
            ),
        )
        .add_type(
            "ActionTimeList",
            TypeDescription::object(
                vec![
                    optional_field("ctrlType", number()),
                    optional_field("index", number()),
                    optional_field("value", number()),
                ],
                None,
            ),
        )
        .build()
}
