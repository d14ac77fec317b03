pub mod delivery_guide;
pub mod requests;

pub use delivery_guide::{
    max_allowed_on_edit, pending_quantity, DeliveryGuide, DeliveryGuideItem,
};
pub use requests::{DeliveryGuideRequest, DeliveryItemInput};
