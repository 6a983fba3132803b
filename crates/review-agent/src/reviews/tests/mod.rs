mod common;
mod hierarchy;
mod routing;
