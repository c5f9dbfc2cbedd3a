use dhcproto::v4::OptionCode;
use netboot_core::modifiers::{
    with_broadcast, with_class_identifier, with_client_identifier, with_hostname,
    with_requested_options,
};
use netboot_core::Modifier;

/// Message customizations requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCustomization {
    pub hostname: Option<String>,
    pub class_id: Option<String>,
    pub client_id: Option<String>,
    pub request_options: Vec<u8>,
    pub unicast: bool,
}

impl RequestCustomization {
    /// Modifiers in a fixed order: identity options, then the request list,
    /// then flags.
    pub fn modifiers(&self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        if let Some(hostname) = &self.hostname {
            modifiers.push(with_hostname(hostname.clone()));
        }
        if let Some(class_id) = &self.class_id {
            modifiers.push(with_class_identifier(class_id.as_bytes().to_vec()));
        }
        if let Some(client_id) = &self.client_id {
            modifiers.push(with_client_identifier(client_id.as_bytes().to_vec()));
        }
        if !self.request_options.is_empty() {
            let codes = self
                .request_options
                .iter()
                .copied()
                .map(OptionCode::from)
                .collect();
            modifiers.push(with_requested_options(codes));
        }
        if self.unicast {
            modifiers.push(with_broadcast(false));
        }
        modifiers
    }
}
