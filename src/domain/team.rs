use serde::{Deserialize, Serialize};

use super::Image;
use crate::locale::LocalizedContent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: LocalizedContent,
    pub role: LocalizedContent,
    pub bio: LocalizedContent,
    pub photo: Option<Image>,
    pub is_ceo: bool,
    /// Display position, ascending.
    pub order: i64,
    pub email: Option<String>,
    pub linkedin: Option<String>,
}

/// Stable sort by display order.
pub fn sort_by_order(members: &mut [TeamMember]) {
    members.sort_by_key(|member| member.order);
}
