/// Increment a stats counter by 1. Compiles to nothing when the `stats`
/// feature is disabled.
macro_rules! stat_inc {
    ($counter:ident) => {
        #[cfg(feature = "stats")]
        {
            $crate::stats::STATS
                .$counter
                .fetch_add(1, ::core::sync::atomic::Ordering::Relaxed);
        }
    };
}

pub(crate) use stat_inc;
