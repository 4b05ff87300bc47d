/// Output shape selected by the `type` query parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    /// Comma-and-space-joined usernames, as plain text.
    Names,
    /// Non-null image paths only.
    ImagePaths,
    /// Full filtered records.
    #[default]
    Json,
}

impl Projection {
    /// `names` and `image-paths` are recognized; anything else falls
    /// back to the default JSON projection.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("names") => Projection::Names,
            Some("image-paths") => Projection::ImagePaths,
            _ => Projection::Json,
        }
    }
}
