use super::optional_field;
use crate::{
    schema_registry::{RegistryError, TypeRegistry},
    type_description::TypeDescription,
};

/// Root of a search response
pub const ROOT: &str = "RoastSearchResults";
/// A single hit inside `hits.hits`
pub const HIT: &str = "Hit";

/// Build the registry for search-result envelopes
pub fn registry() -> Result<TypeRegistry, RegistryError> {
    let number = TypeDescription::number;
    let string = TypeDescription::string;
    let reference = |name: &str| TypeDescription::reference(name);
    let nullable_number =
        || TypeDescription::union_of(vec![TypeDescription::number(), TypeDescription::null()]);

    TypeRegistry::builder()
        .add_type(
            ROOT,
            TypeDescription::object(
                vec![
                    optional_field("took", number()),
                    optional_field("timed_out", TypeDescription::boolean()),
                    optional_field("_shards", reference("Shards")),
                    optional_field("hits", reference("Hits")),
                ],
                None,
            ),
        )
        .add_type(
            "Shards",
            TypeDescription::object(
                vec![
                    optional_field("total", number()),
                    optional_field("successful", number()),
                    optional_field("skipped", number()),
                    optional_field("failed", number()),
                ],
                None,
            ),
        )
        .add_type(
            "Hits",
            TypeDescription::object(
                vec![
                    optional_field("total", reference("Total")),
                    optional_field("max_score", TypeDescription::null()),
                    optional_field("hits", TypeDescription::array_of(reference(HIT))),
                ],
                None,
            ),
        )
        .add_type(
            HIT,
            TypeDescription::object(
                vec![
                    optional_field("_index", reference("Index")),
                    optional_field("_type", reference("Type")),
                    optional_field("_id", string()),
                    optional_field("_score", TypeDescription::null()),
                    optional_field("_source", reference("Source")),
                    optional_field("sort", TypeDescription::array_of(number())),
                ],
                None,
            ),
        )
        .add_type(
            "Source",
            TypeDescription::object(
                vec![
                    optional_field("url", string()),
                    optional_field("isPrivate", number()),
                    optional_field("userId", string()),
                    optional_field("roastName", string()),
                    optional_field("weightGreen", number()),
                    optional_field("weightRoasted", number()),
                    optional_field("totalRoastTime", number()),
                    optional_field("dateTime", number()),
                    optional_field("preheatTemperature", number()),
                    optional_field("rating", nullable_number()),
                    optional_field("hardware", number()),
                    optional_field("serialNumber", number()),
                    optional_field("roastDegree", number()),
                    optional_field("updatedAt", number()),
                    optional_field("deleted", number()),
                    optional_field("firstCrackTime", number()),
                    optional_field("firstCrackTemp", nullable_number()),
                    optional_field("firstCrackIRTemp", nullable_number()),
                    optional_field("recipeID", string()),
                    optional_field(
                        "beanId",
                        TypeDescription::union_of(vec![TypeDescription::null(), string()]),
                    ),
                    optional_field("playbackID", string()),
                ],
                None,
            ),
        )
        .add_type(
            "Total",
            TypeDescription::object(
                vec![
                    optional_field("value", number()),
                    optional_field("relation", string()),
                ],
                None,
            ),
        )
        .add_type("Index", TypeDescription::enumeration(["roasts"]))
        .add_type("Type", TypeDescription::enumeration(["_doc"]))
        .build()
}
