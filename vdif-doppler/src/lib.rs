//! Доплеровское растяжение времени
//!
//! Профиль задержки RTT(t) приводится к одному значению на выборку
//! ([`RttProfile::resample`]), после чего [`TimeWarp`] переводит сигнал из
//! времени передатчика во время приёмника и обратно.

pub mod rtt;
pub mod shift;

pub use rtt::*;
pub use shift::*;
