//! Warnings for things an operator should look at; they go through
//! the `log` facade so the host decides where they end up.

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        ::log::warn!("{} at {:?} line {}",
                     format_args!($($arg)*), file!(), line!())
    }
}
