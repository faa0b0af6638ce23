pub mod chat;
pub mod intent;
pub mod profile;
pub mod suggestion;
pub mod trip;

pub use chat::{ChatMessage, ChatStyle};
pub use intent::Intent;
pub use profile::ConciergeProfile;
pub use suggestion::{
    AccommodationSuggestion, ItineraryItemSuggestion, RestaurantSuggestion, StructuredSuggestion,
};
pub use trip::TripContext;
