pub mod entitlement_overrides;
