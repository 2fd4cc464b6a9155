// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod dashboard;
pub mod detail;
pub mod forms;
pub mod ids;
pub mod loan;
pub mod model;
pub mod session;
pub mod state;
pub mod table;
pub mod wizard;

pub use dashboard::*;
pub use detail::*;
pub use forms::*;
pub use ids::*;
pub use loan::*;
pub use model::*;
pub use session::*;
pub use state::*;
pub use table::*;
pub use wizard::*;
