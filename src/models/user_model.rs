use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct UserFavorites {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub favorites: Vec<String>,
}
