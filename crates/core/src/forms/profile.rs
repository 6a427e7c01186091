use serde::{Deserialize, Serialize};

use super::progress::percentage;

/// Profile fields considered for completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCompletion {
    pub has_display_name: bool,
    pub has_bio: bool,
    pub has_location: bool,
    pub has_website: bool,
    pub has_photo: bool,
    pub total_score: usize,
    pub percentage: u8,
    /// Labels of the fields still missing, in display order.
    pub missing_fields: Vec<String>,
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

pub fn calculate_profile_completion(profile: &ProfileFields) -> ProfileCompletion {
    let has_display_name = non_empty(&profile.display_name);
    let has_bio = non_blank(&profile.bio);
    let has_location = non_blank(&profile.location);
    let has_website = non_blank(&profile.website);
    let has_photo = non_empty(&profile.photo_url);

    let fields = [
        ("Display Name", has_display_name),
        ("Bio", has_bio),
        ("Location", has_location),
        ("Website", has_website),
        ("Profile Photo", has_photo),
    ];
    let total_score = fields.iter().filter(|(_, done)| *done).count();
    let missing_fields = fields
        .iter()
        .filter(|(_, done)| !*done)
        .map(|(label, _)| label.to_string())
        .collect();

    ProfileCompletion {
        has_display_name,
        has_bio,
        has_location,
        has_website,
        has_photo,
        total_score,
        percentage: percentage(total_score, fields.len()),
        missing_fields,
    }
}

/// Encouragement shown next to the completion bar.
pub fn completion_message(percentage: u8) -> &'static str {
    match percentage {
        100.. => "Your profile is complete! 🎉",
        80..=99 => "Your profile is almost complete!",
        60..=79 => "Your profile is looking good!",
        40..=59 => "Your profile needs some work.",
        _ => "Your profile is just getting started.",
    }
}
