pub mod catalog;
pub mod dish;
pub mod template;
pub mod user;
pub mod view_history;

pub use catalog::{Category, CategoryRef, Region, RegionRef};
pub use dish::{Dish, DishStatus, DishSummary, DishWithRefs};
pub use template::SavedTemplate;
pub use user::{User, UserRole, UserSummary};
pub use view_history::ViewHistory;
