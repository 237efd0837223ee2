use crate::mac_address::MacAddress;

/// A stable MAC address for unit tests.
pub const TEST_MAC: MacAddress = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

/// Address used by the BTHome reference advertisements below.
pub const BTHOME_MAC: MacAddress = MacAddress([0x54, 0x48, 0xE6, 0x8F, 0x80, 0xA5]);

/// AES key the encrypted BTHome reference advertisements were sealed with.
pub const BTHOME_KEY: [u8; 16] = [
    0x23, 0x1D, 0x39, 0xC1, 0xD7, 0xCC, 0x1A, 0xB1, 0xAE, 0xE2, 0x24, 0xCD, 0x09, 0x6D, 0xB9, 0x32,
];

/// BTHome V1: packet 9, battery 97 %, rssi -52.
pub const BTHOME_BATTERY_EVENT: &str = "043E1902010000A5808FE648540D02010609161C18020009020161CC";

/// BTHome V1: temperature 25.06 °C and humidity 50.55 %, no packet id.
pub const BTHOME_CLIMATE_EVENT: &str =
    "043E1B02010000A5808FE648540F0201060B161C182302CA090303BF13CC";

/// Encrypted BTHome V1 carrying the same values as [`BTHOME_CLIMATE_EVENT`].
pub const BTHOME_ENCRYPTED_EVENT: &str =
    "043E2302010000A5808FE648541702010613161e18fba435e4d3c312fb0011223357d90a99CC";

/// BTHome V1: packet 12, pressure 1008.83 mbar, rssi -36.
pub const BTHOME_PRESSURE_EVENT: &str =
    "043E1B02010000A5808FE648540F0201060B161C1802000C0404138A01DC";

/// Almendo bluSensor Mini from FC:F5:C4:64:BA:0E, rssi -43.
pub const ALMENDO_EVENT: &str =
    "043e26020100000eba64c4f5fc1a02010613ffe806010a0a08011800be0a8b128208860505020a09d5";

/// Jaalee JHT from D0:9F:FF:81:85:13: 7.41 °C, 38.06 %, rssi -52.
pub const JAALEE_EVENT: &str = concat!(
    "043e3a02010000138581ff9fd02e0201060e1625f560138581ff9fd04f105a3e",
    "1bff4c000215ebefd08370a247c89837e7b5634df5254f105a3ecb60cc",
);

/// RuuviTag format 5 manufacturer data (without the company id).
pub const RUUVI_V5_PAYLOAD: [u8; 24] = [
    0x05, // Format 5
    0x12, 0xFC, // Temperature: 24.30°C (0x12FC = 4860, 4860 * 0.005 = 24.30)
    0x53, 0x94, // Humidity: 53.49% (0x5394 = 21396, 21396 * 0.0025 = 53.49)
    0xC3, 0x7C, // Pressure: 100044 Pa (0xC37C = 50044, 50044 + 50000 = 100044)
    0x00, 0x04, // Acceleration X: 4 mG
    0xFF, 0xFC, // Acceleration Y: -4 mG
    0x04, 0x0C, // Acceleration Z: 1036 mG
    0xAC, 0x36, // Battery: 2977 mV, TX Power: 4 dBm
    0x42, // Movement counter: 66
    0x00, 0xCD, // Sequence: 205
    0xCB, 0xB8, 0x33, 0x4C, 0x88, 0x4F, // MAC address
];

/// RuuviTag format 6 manufacturer data (includes format byte and compact MAC).
pub const RUUVI_V6_PAYLOAD: [u8; 20] = [
    0x06, 0x17, 0x0C, 0x56, 0x68, 0xC7, 0x9E, 0x00, 0x70, 0x00, 0xC9, 0x05, 0x01, 0xD9, 0xFF,
    0xCD, 0x00, 0x4C, 0x88, 0x4F,
];

/// Wrap AD data in an HCI LE advertising report event.
pub fn hci_event(address: MacAddress, rssi: i8, ad_data: &[u8]) -> Vec<u8> {
    let mut event = vec![0x04, 0x3E, 0x00, 0x02, 0x01, 0x00, 0x00];
    event.extend(address.0.iter().rev());
    event.push(ad_data.len() as u8);
    event.extend_from_slice(ad_data);
    event.push(rssi as u8);
    event[2] = (event.len() - 3) as u8;
    event
}

/// HCI event carrying RuuviTag manufacturer data.
pub fn ruuvi_event(address: MacAddress, rssi: i8, payload: &[u8]) -> Vec<u8> {
    let mut ad = vec![0x02, 0x01, 0x06, (payload.len() + 3) as u8, 0xFF, 0x99, 0x04];
    ad.extend_from_slice(payload);
    hci_event(address, rssi, &ad)
}
