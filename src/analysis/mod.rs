//! Derived quantities over the filtered window: KPIs, FAD/LAD biomarkers
//! and the full pass that ties them to the render plan.

pub mod biomarker;
pub mod pipeline;
pub mod summary;
