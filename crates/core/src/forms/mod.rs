//! Form completion helpers.

mod profile;
mod progress;

pub use profile::{calculate_profile_completion, completion_message, ProfileCompletion, ProfileFields};
pub use progress::{calculate_form_progress, FormField, FormProgress};
