//! Wire-format items of HID report descriptors, plus a small short-item parser used to
//! work out where each input field of a report lives.
#![no_std]

use bitfield::bitfield;

/// GlobalItemKind describes global item tags as described in section 6.2.2.7
/// 'Report Descriptor' of the spec, version 1.11.
#[repr(u8)]
#[allow(unused)]
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum GlobalItemKind {
    UsagePage = 0,
    LogicalMin = 1,
    LogicalMax = 2,
    PhysicalMin = 3,
    PhysicalMax = 4,
    UnitExponent = 5,
    Unit = 6,
    ReportSize = 7,
    ReportID = 8,
    ReportCount = 9,
    Push = 10,
    Pop = 11,
}

impl GlobalItemKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::UsagePage,
            1 => Self::LogicalMin,
            2 => Self::LogicalMax,
            3 => Self::PhysicalMin,
            4 => Self::PhysicalMax,
            5 => Self::UnitExponent,
            6 => Self::Unit,
            7 => Self::ReportSize,
            8 => Self::ReportID,
            9 => Self::ReportCount,
            10 => Self::Push,
            11 => Self::Pop,
            _ => return None,
        })
    }
}

/// LocalItemKind describes local item tags as described in section 6.2.2.8
/// 'Local Items' of the spec, version 1.11.
#[repr(u8)]
#[allow(unused)]
#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum LocalItemKind {
    Usage = 0,
    UsageMin = 1,
    UsageMax = 2,
    DesignatorIdx = 3,
    DesignatorMin = 4,
    DesignatorMax = 5,
    StringIdx = 7,
    StringMin = 8,
    StringMax = 9,
    Delimiter = 10,
}

impl LocalItemKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Usage,
            1 => Self::UsageMin,
            2 => Self::UsageMax,
            3 => Self::DesignatorIdx,
            4 => Self::DesignatorMin,
            5 => Self::DesignatorMax,
            7 => Self::StringIdx,
            8 => Self::StringMin,
            9 => Self::StringMax,
            10 => Self::Delimiter,
            _ => return None,
        })
    }
}

/// MainItemKind describes main item tags as described in section 6.2.2.4
/// 'Report Descriptor' of the spec, version 1.11.
#[repr(u8)]
#[allow(unused)]
#[derive(Copy, Debug, Clone, Eq, PartialEq, Default)]
pub enum MainItemKind {
    #[default]
    Input = 0b1000,
    Output = 0b1001,
    Feature = 0b1011,
    Collection = 0b1010,
    EndCollection = 0b1100,
}

impl From<MainItemKind> for u8 {
    fn from(kind: MainItemKind) -> u8 {
        kind as u8
    }
}

impl MainItemKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0b1000 => Self::Input,
            0b1001 => Self::Output,
            0b1011 => Self::Feature,
            0b1010 => Self::Collection,
            0b1100 => Self::EndCollection,
            _ => return None,
        })
    }
}

/// ItemType describes types of items as described in section 6.2.2.7
/// 'Report Descriptor' of the spec, version 1.11.
#[repr(u8)]
#[allow(unused)]
#[derive(Copy, Debug, Clone, Eq, PartialEq, Default)]
pub enum ItemType {
    #[default]
    Main = 0,
    Global = 1,
    Local = 2,
    Reserved = 3,
}

impl From<u8> for ItemType {
    fn from(bits: u8) -> ItemType {
        match bits & 0b11 {
            0 => ItemType::Main,
            1 => ItemType::Global,
            2 => ItemType::Local,
            _ => ItemType::Reserved,
        }
    }
}

bitfield! {
    /// MainItemSetting describes the bits which configure invariants on a MainItem.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct MainItemSetting(u8);
    impl Debug;
    pub is_constant, set_constant: 0;
    pub is_variable, set_variable: 1;
    pub is_relative, set_relative: 2;
    pub is_wrap, set_wrap: 3;
    pub is_non_linear, set_non_linear: 4;
    pub has_no_preferred_state, set_no_preferred_state: 5;
    pub has_null_state, set_has_null_state: 6;
    pub volatile, set_volatile: 7;
}

bitfield! {
    /// ItemPrefix describes the 1 byte prefix describing an item in a descriptor.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct ItemPrefix(u8);
    impl Debug;
    pub byte_count, set_byte_count: 1, 0;
    pub typ, set_type: 3, 2;
    pub tag, set_tag: 7, 4;
}

/// Prefix byte which introduces a long item.
const LONG_ITEM_PREFIX: u8 = 0xFE;

impl ItemPrefix {
    /// Number of data bytes following the prefix. A size code of 3 means 4 bytes.
    pub fn data_len(&self) -> usize {
        match self.byte_count() {
            3 => 4,
            n => n as usize,
        }
    }

    pub fn item_type(&self) -> ItemType {
        ItemType::from(self.typ())
    }
}

/// A single short item decoded from a report descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item<'a> {
    pub prefix: ItemPrefix,
    pub data: &'a [u8],
}

impl Item<'_> {
    /// Item data as an unsigned little-endian value.
    pub fn data_u32(&self) -> u32 {
        self.data
            .iter()
            .rev()
            .fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
    }

    /// Item data sign-extended from its encoded width.
    pub fn data_i32(&self) -> i32 {
        let raw = self.data_u32();
        match self.data.len() {
            1 => raw as u8 as i8 as i32,
            2 => raw as u16 as i16 as i32,
            _ => raw as i32,
        }
    }

    pub fn main_kind(&self) -> Option<MainItemKind> {
        match self.prefix.item_type() {
            ItemType::Main => MainItemKind::from_tag(self.prefix.tag()),
            _ => None,
        }
    }

    pub fn local_kind(&self) -> Option<LocalItemKind> {
        match self.prefix.item_type() {
            ItemType::Local => LocalItemKind::from_tag(self.prefix.tag()),
            _ => None,
        }
    }

    pub fn global_kind(&self) -> Option<GlobalItemKind> {
        match self.prefix.item_type() {
            ItemType::Global => GlobalItemKind::from_tag(self.prefix.tag()),
            _ => None,
        }
    }
}

/// Iterator over the short items of a report descriptor.
///
/// Long items are skipped. Iteration stops at the first truncated item.
#[derive(Clone, Debug)]
pub struct Items<'a> {
    rest: &'a [u8],
}

impl<'a> Items<'a> {
    pub fn new(desc: &'a [u8]) -> Self {
        Self { rest: desc }
    }
}

impl<'a> Iterator for Items<'a> {
    type Item = Item<'a>;

    fn next(&mut self) -> Option<Item<'a>> {
        loop {
            let (&first, tail) = self.rest.split_first()?;
            if first == LONG_ITEM_PREFIX {
                // bDataSize, bLongItemTag, then data.
                let len = *tail.first()? as usize;
                self.rest = tail.get(2 + len..)?;
                continue;
            }
            let prefix = ItemPrefix(first);
            let len = prefix.data_len();
            let data = tail.get(..len)?;
            self.rest = &tail[len..];
            return Some(Item { prefix, data });
        }
    }
}

/// Location of one input main item inside a report.
///
/// `bit_offset` counts from the first bit after the report ID byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputField {
    pub report_id: u8,
    pub bit_offset: u32,
    pub report_size: u32,
    pub report_count: u32,
    pub logical_min: i32,
    pub logical_max: i32,
    pub usage_page: u16,
    /// First usage of the item: its Usage or Usage Minimum, 0 when none was given.
    pub usage: u16,
    pub setting: MainItemSetting,
}

impl InputField {
    pub fn bit_len(&self) -> u32 {
        self.report_size * self.report_count
    }
}

/// Walks a report descriptor and yields every input field belonging to one report.
///
/// Global state is tracked as the HID parser does, so report size, count, logical
/// range and usage page carry over between main items, while usages are cleared after
/// each one. Push and pop are not supported; a descriptor using them yields no further
/// fields.
#[derive(Clone, Debug)]
pub struct InputLayout<'a> {
    items: Items<'a>,
    wanted_id: u8,
    report_id: u8,
    report_size: u32,
    report_count: u32,
    logical_min: i32,
    logical_max: i32,
    usage_page: u16,
    usage: Option<u32>,
    bit_offset: u32,
}

impl<'a> InputLayout<'a> {
    /// Lays out the report with `report_id`. Use 0 for descriptors without report IDs.
    pub fn new(desc: &'a [u8], report_id: u8) -> Self {
        Self {
            items: Items::new(desc),
            wanted_id: report_id,
            report_id: 0,
            report_size: 0,
            report_count: 0,
            logical_min: 0,
            logical_max: 0,
            usage_page: 0,
            usage: None,
            bit_offset: 0,
        }
    }

    /// Total bits of input data in the report, excluding the report ID.
    pub fn total_bits(self) -> u32 {
        self.map(|f| f.bit_len()).sum()
    }
}

impl Iterator for InputLayout<'_> {
    type Item = InputField;

    fn next(&mut self) -> Option<InputField> {
        loop {
            let item = self.items.next()?;
            if let Some(kind) = item.global_kind() {
                match kind {
                    GlobalItemKind::ReportSize => self.report_size = item.data_u32(),
                    GlobalItemKind::ReportCount => self.report_count = item.data_u32(),
                    GlobalItemKind::ReportID => self.report_id = item.data_u32() as u8,
                    GlobalItemKind::UsagePage => self.usage_page = item.data_u32() as u16,
                    GlobalItemKind::LogicalMin => self.logical_min = item.data_i32(),
                    // A maximum is only negative when the minimum is.
                    GlobalItemKind::LogicalMax if self.logical_min < 0 => {
                        self.logical_max = item.data_i32()
                    }
                    GlobalItemKind::LogicalMax => self.logical_max = item.data_u32() as i32,
                    GlobalItemKind::Push | GlobalItemKind::Pop => return None,
                    _ => {}
                }
                continue;
            }

            match item.local_kind() {
                Some(LocalItemKind::Usage | LocalItemKind::UsageMin) => {
                    self.usage.get_or_insert(item.data_u32());
                    continue;
                }
                Some(_) => continue,
                None => {}
            }

            let Some(kind) = item.main_kind() else {
                continue;
            };
            let usage = self.usage.take();
            if kind != MainItemKind::Input || self.report_id != self.wanted_id {
                continue;
            }

            // A four byte usage carries its own usage page in the high half.
            let (usage_page, usage) = match usage {
                Some(u) if u > 0xFFFF => ((u >> 16) as u16, u as u16),
                Some(u) => (self.usage_page, u as u16),
                None => (self.usage_page, 0),
            };

            let field = InputField {
                report_id: self.report_id,
                bit_offset: self.bit_offset,
                report_size: self.report_size,
                report_count: self.report_count,
                logical_min: self.logical_min,
                logical_max: self.logical_max,
                usage_page,
                usage,
                setting: MainItemSetting(item.data_u32() as u8),
            };
            self.bit_offset += field.bit_len();
            return Some(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_fields() {
        // Logical Maximum, 4 bytes
        let prefix = ItemPrefix(0x27);
        assert_eq!(prefix.tag(), 2);
        assert_eq!(prefix.item_type(), ItemType::Global);
        assert_eq!(prefix.data_len(), 4);

        // Input
        let prefix = ItemPrefix(0x81);
        assert_eq!(prefix.tag(), u8::from(MainItemKind::Input));
        assert_eq!(prefix.item_type(), ItemType::Main);
        assert_eq!(prefix.data_len(), 1);
    }

    #[test]
    fn test_item_data_sign() {
        let items: [u8; 8] = [
            0x15, 0x81, //       Logical Minimum (-127)
            0x16, 0x00, 0x80, // Logical Minimum (-32768)
            0x26, 0xFF, 0x7F, // Logical Maximum (32767)
        ];
        let parsed: [i32; 3] = {
            let mut it = Items::new(&items).map(|i| i.data_i32());
            [it.next().unwrap(), it.next().unwrap(), it.next().unwrap()]
        };
        assert_eq!(parsed, [-127, -32768, 32767]);
    }

    #[test]
    fn test_local_item_kinds() {
        let desc = &[0x09, 0x30, 0x19, 0x01, 0x29, 0x20, 0x05, 0x09];
        let mut items = Items::new(desc);
        assert_eq!(items.next().unwrap().local_kind(), Some(LocalItemKind::Usage));
        assert_eq!(items.next().unwrap().local_kind(), Some(LocalItemKind::UsageMin));
        assert_eq!(items.next().unwrap().local_kind(), Some(LocalItemKind::UsageMax));
        let page = items.next().unwrap();
        assert_eq!(page.local_kind(), None);
        assert_eq!(page.global_kind(), Some(GlobalItemKind::UsagePage));
    }

    #[test]
    fn test_extended_usage() {
        let desc = &[
            0x05, 0x01, //                   Usage Page (Generic Desktop)
            0x0B, 0xBB, 0x00, 0x02, 0x00, // Usage (Simulation Controls: Throttle)
            0x75, 0x08, //                   Report Size (8)
            0x95, 0x01, //                   Report Count (1)
            0x81, 0x02, //                   Input (Data, Variable, Absolute)
        ];
        let field = InputLayout::new(desc, 0).next().unwrap();
        assert_eq!((field.usage_page, field.usage), (0x02, 0xBB));
    }

    #[test]
    fn test_long_item_skipped() {
        let desc = &[0xFE, 0x02, 0x10, 0xAA, 0xBB, 0xC0];
        let mut items = Items::new(desc);
        let item = items.next().unwrap();
        assert_eq!(item.main_kind(), Some(MainItemKind::EndCollection));
        assert!(items.next().is_none());
    }

    #[test]
    fn test_truncated_item_stops() {
        let desc = &[0x26, 0xFF];
        assert!(Items::new(desc).next().is_none());
    }

    #[test]
    fn test_layout_of_mouse_like_report() {
        let desc = &[
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x02, // Usage (Mouse)
            0xA1, 0x01, // Collection (Application)
            0x85, 0x02, //   Report ID (2)
            0x05, 0x09, //   Usage Page (Button)
            0x19, 0x01, //   Usage Minimum (Button 1)
            0x29, 0x03, //   Usage Maximum (Button 3)
            0x15, 0x00, //   Logical Minimum (0)
            0x25, 0x01, //   Logical Maximum (1)
            0x75, 0x01, //   Report Size (1)
            0x95, 0x03, //   Report Count (3)
            0x81, 0x02, //   Input (Data, Variable, Absolute)
            0x95, 0x05, //   Report Count (5)
            0x81, 0x03, //   Input (Constant, Variable, Absolute)
            0x05, 0x01, //   Usage Page (Generic Desktop)
            0x09, 0x30, //   Usage (X)
            0x09, 0x31, //   Usage (Y)
            0x15, 0x81, //   Logical Minimum (-127)
            0x25, 0x7F, //   Logical Maximum (127)
            0x75, 0x08, //   Report Size (8)
            0x95, 0x02, //   Report Count (2)
            0x81, 0x06, //   Input (Data, Variable, Relative)
            0xC0, // End Collection
        ];

        let mut layout = InputLayout::new(desc, 2);
        let buttons = layout.next().unwrap();
        assert_eq!((buttons.bit_offset, buttons.bit_len()), (0, 3));
        assert_eq!((buttons.usage_page, buttons.usage), (0x09, 0x01));
        assert!(buttons.setting.is_variable());

        let padding = layout.next().unwrap();
        assert_eq!((padding.bit_offset, padding.bit_len()), (3, 5));
        assert_eq!((padding.usage_page, padding.usage), (0x09, 0));
        assert!(padding.setting.is_constant());

        let axes = layout.next().unwrap();
        assert_eq!((axes.bit_offset, axes.report_size, axes.report_count), (8, 8, 2));
        assert_eq!((axes.usage_page, axes.usage), (0x01, 0x30));
        assert_eq!((axes.logical_min, axes.logical_max), (-127, 127));
        assert!(axes.setting.is_relative());
        assert!(layout.next().is_none());

        assert_eq!(InputLayout::new(desc, 2).total_bits(), 24);
        assert_eq!(InputLayout::new(desc, 1).total_bits(), 0);
    }
}
