/// The set of named predicates recognized by the query engine, parsed
/// from raw query parameters. Absent fields impose no constraint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSpec {
    pub species: Option<String>,
    pub friend_status: Option<bool>,
    pub min_high_score: Option<i64>,
    pub option: Option<String>,
    pub house: Option<String>,
    pub gender: Option<String>,
    pub graduation: Option<String>,
}

impl FilterSpec {
    /// Build a spec from raw `(name, value)` query pairs.
    ///
    /// Names are case-sensitive and use the external spelling
    /// (`min-highscore`, `friend-status`). Unrecognized names are
    /// ignored, as are empty values, a `friend-status` that is neither
    /// `true` nor `false`, and a `min-highscore` that does not parse as
    /// an integer.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut spec = FilterSpec::default();
        for (name, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match name {
                "species" => spec.species = Some(value.to_owned()),
                "friend-status" => {
                    spec.friend_status = match value {
                        "true" => Some(true),
                        "false" => Some(false),
                        _ => None,
                    }
                }
                "min-highscore" => spec.min_high_score = value.parse().ok(),
                "option" => spec.option = Some(value.to_owned()),
                "house" => spec.house = Some(value.to_owned()),
                "gender" => spec.gender = Some(value.to_owned()),
                "graduation" => spec.graduation = Some(value.to_owned()),
                _ => {}
            }
        }
        spec
    }

    /// The artifact-relevant subset, in the fixed order used for cache
    /// keys and descriptions.
    pub fn artifact_components(&self) -> [Option<&str>; 4] {
        [
            self.option.as_deref(),
            self.house.as_deref(),
            self.gender.as_deref(),
            self.graduation.as_deref(),
        ]
    }
}
