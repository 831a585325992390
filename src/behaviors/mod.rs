pub(crate) mod arrive;
pub(crate) mod avoid;
pub(crate) mod seek;
