//! Resource vocabulary of the device protocol.
//!
//! The first path segment names the service (`ro`, `ei`, `ci`, `iz`, `ce`,
//! `ni`); the service's version is negotiated through `/ci/services`.

use phf::phf_map;

/// Known resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// `/ro/values`
    Values,
    /// `/ro/descriptionChange`
    DescriptionChange,
    /// `/ro/allMandatoryValues`
    AllMandatoryValues,
    /// `/ro/allDescriptionChanges`
    AllDescriptionChanges,
    /// `/ro/activeProgram`
    ActiveProgram,
    /// `/ro/selectedProgram`
    SelectedProgram,
    /// `/ei/initialValues`
    InitialValues,
    /// `/ei/deviceReady`
    DeviceReady,
    /// `/ci/services`
    Services,
    /// `/ci/registeredDevices`
    RegisteredDevices,
    /// `/ci/pairableDevices`
    PairableDevices,
    /// `/ci/delregistration`
    DelRegistration,
    /// `/ci/networkDetails`
    NetworkDetails,
    /// `/ci/networkDetails2`
    NetworkDetails2,
    /// `/ci/wifiNetworks`
    WifiNetworks,
    /// `/ci/wifiSetting`
    WifiSetting,
    /// `/ci/wifiSetting2`
    WifiSetting2,
    /// `/ci/tzInfo`
    TzInfo,
    /// `/ci/authentication`
    Authentication,
    /// `/ci/register`
    Register,
    /// `/ci/deregister`
    Deregister,
    /// `/ci/info`
    CiInfo,
    /// `/iz/info`
    IzInfo,
    /// `/iz/services`
    IzServices,
    /// `/ce/serverDeviceType`
    ServerDeviceType,
    /// `/ce/serverCredential`
    ServerCredential,
    /// `/ce/clientCredential`
    ClientCredential,
    /// `/ce/hubInformation`
    HubInformation,
    /// `/ce/hubConnected`
    HubConnected,
    /// `/ce/status`
    CeStatus,
    /// `/ni/config`
    NiConfig,
    /// `/ni/info`
    NiInfo,
}

/// Wire path -> resource
static RESOURCES: phf::Map<&'static str, Resource> = phf_map! {
    "/ro/values" => Resource::Values,
    "/ro/descriptionChange" => Resource::DescriptionChange,
    "/ro/allMandatoryValues" => Resource::AllMandatoryValues,
    "/ro/allDescriptionChanges" => Resource::AllDescriptionChanges,
    "/ro/activeProgram" => Resource::ActiveProgram,
    "/ro/selectedProgram" => Resource::SelectedProgram,
    "/ei/initialValues" => Resource::InitialValues,
    "/ei/deviceReady" => Resource::DeviceReady,
    "/ci/services" => Resource::Services,
    "/ci/registeredDevices" => Resource::RegisteredDevices,
    "/ci/pairableDevices" => Resource::PairableDevices,
    "/ci/delregistration" => Resource::DelRegistration,
    "/ci/networkDetails" => Resource::NetworkDetails,
    "/ci/networkDetails2" => Resource::NetworkDetails2,
    "/ci/wifiNetworks" => Resource::WifiNetworks,
    "/ci/wifiSetting" => Resource::WifiSetting,
    "/ci/wifiSetting2" => Resource::WifiSetting2,
    "/ci/tzInfo" => Resource::TzInfo,
    "/ci/authentication" => Resource::Authentication,
    "/ci/register" => Resource::Register,
    "/ci/deregister" => Resource::Deregister,
    "/ci/info" => Resource::CiInfo,
    "/iz/info" => Resource::IzInfo,
    "/iz/services" => Resource::IzServices,
    "/ce/serverDeviceType" => Resource::ServerDeviceType,
    "/ce/serverCredential" => Resource::ServerCredential,
    "/ce/clientCredential" => Resource::ClientCredential,
    "/ce/hubInformation" => Resource::HubInformation,
    "/ce/hubConnected" => Resource::HubConnected,
    "/ce/status" => Resource::CeStatus,
    "/ni/config" => Resource::NiConfig,
    "/ni/info" => Resource::NiInfo,
};

impl Resource {
    /// Look up a wire path
    pub fn from_path(path: &str) -> Option<Self> {
        RESOURCES.get(path).copied()
    }

    /// Wire path
    pub fn path(self) -> &'static str {
        match self {
            Resource::Values => "/ro/values",
            Resource::DescriptionChange => "/ro/descriptionChange",
            Resource::AllMandatoryValues => "/ro/allMandatoryValues",
            Resource::AllDescriptionChanges => "/ro/allDescriptionChanges",
            Resource::ActiveProgram => "/ro/activeProgram",
            Resource::SelectedProgram => "/ro/selectedProgram",
            Resource::InitialValues => "/ei/initialValues",
            Resource::DeviceReady => "/ei/deviceReady",
            Resource::Services => "/ci/services",
            Resource::RegisteredDevices => "/ci/registeredDevices",
            Resource::PairableDevices => "/ci/pairableDevices",
            Resource::DelRegistration => "/ci/delregistration",
            Resource::NetworkDetails => "/ci/networkDetails",
            Resource::NetworkDetails2 => "/ci/networkDetails2",
            Resource::WifiNetworks => "/ci/wifiNetworks",
            Resource::WifiSetting => "/ci/wifiSetting",
            Resource::WifiSetting2 => "/ci/wifiSetting2",
            Resource::TzInfo => "/ci/tzInfo",
            Resource::Authentication => "/ci/authentication",
            Resource::Register => "/ci/register",
            Resource::Deregister => "/ci/deregister",
            Resource::CiInfo => "/ci/info",
            Resource::IzInfo => "/iz/info",
            Resource::IzServices => "/iz/services",
            Resource::ServerDeviceType => "/ce/serverDeviceType",
            Resource::ServerCredential => "/ce/serverCredential",
            Resource::ClientCredential => "/ce/clientCredential",
            Resource::HubInformation => "/ce/hubInformation",
            Resource::HubConnected => "/ce/hubConnected",
            Resource::CeStatus => "/ce/status",
            Resource::NiConfig => "/ni/config",
            Resource::NiInfo => "/ni/info",
        }
    }
}

/// Service segment of a resource path (`/ci/info` -> `ci`).
///
/// Returns `None` for paths without a separator.
pub fn service_of(path: &str) -> Option<&str> {
    path.split('/').nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_table_is_consistent() {
        for (path, resource) in RESOURCES.entries() {
            assert_eq!(resource.path(), *path);
        }
        assert_eq!(RESOURCES.len(), 32);
    }

    #[test]
    fn test_unknown_path() {
        assert_eq!(Resource::from_path("/ro/values"), Some(Resource::Values));
        assert_eq!(Resource::from_path("/ro/unknown"), None);
        assert_eq!(Resource::from_path("ro/values"), None);
    }

    #[test]
    fn test_service_segment() {
        assert_eq!(service_of("/ci/info"), Some("ci"));
        assert_eq!(service_of("/ro/allMandatoryValues"), Some("ro"));
        assert_eq!(service_of("/"), Some(""));
        assert_eq!(service_of("values"), None);
    }
}
