//! Cross-component flows driven through the public `HyperionApi`.

mod flows;
