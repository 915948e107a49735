//! Partition role classification
//!
//! Pure keyword heuristics over the strings a descriptor block carries
//! (display name, device node, declared type, image filenames). Roles are
//! resolved by an ordered rule table so that the first matching rule wins;
//! the order is load-bearing (a name containing both "dtb" and "kernel"
//! classifies as `dtb`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic role of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// First/second stage bootloader (U-Boot, SPL)
    Bootloader,
    /// Device tree blob
    Dtb,
    /// Kernel image
    Kernel,
    /// Root filesystem
    Rootfs,
    /// Vendor system partition
    System,
    /// User/application data
    Userdata,
    /// Recovery image
    Recovery,
    /// Bootloader environment
    Env,
    /// Nothing matched
    Unknown,
}

impl Role {
    /// Stable lowercase name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Bootloader => "bootloader",
            Role::Dtb => "dtb",
            Role::Kernel => "kernel",
            Role::Rootfs => "rootfs",
            Role::System => "system",
            Role::Userdata => "userdata",
            Role::Recovery => "recovery",
            Role::Env => "env",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered (keywords, role) rules; first rule with any keyword present wins
const ROLE_RULES: &[(&[&str], Role)] = &[
    (&["uboot", "u-boot", "spl", "bootloader"], Role::Bootloader),
    (&["dtb", "devicetree"], Role::Dtb),
    (&["kernel", "zimage", "uimage", "image"], Role::Kernel),
    (&["rootfs", "squashfs"], Role::Rootfs),
    (&["system"], Role::System),
    (&["userdata", "udisk", "printer_data", "data"], Role::Userdata),
    (&["recovery"], Role::Recovery),
    (&["env"], Role::Env),
];

/// Substrings of the "_a" slot family (checked before the "_b" family)
const SLOT_A_MARKERS: &[&str] = &["slot_a", "_a", "rootfs_a", "kernel_a"];

/// Substrings of the "_b" slot family
const SLOT_B_MARKERS: &[&str] = &["slot_b", "_b", "rootfs_b", "kernel_b"];

/// Roles that are critical no matter what the strings say
const CRITICAL_ROLES: &[Role] = &[
    Role::Bootloader,
    Role::Kernel,
    Role::Rootfs,
    Role::Dtb,
    Role::Env,
    Role::Recovery,
];

/// Name/device substrings that force criticality regardless of role
const CRITICAL_MARKERS: &[&str] = &["boot", "uboot", "spl", "env"];

/// Result of classifying one partition's strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Semantic role
    pub role: Role,
    /// A/B slot: 0 for the A slot, 1 for B, -1 when unslotted
    pub slot: i8,
    /// Whether bricking this partition can brick the device
    pub critical: bool,
}

/// Classify a partition from its descriptor strings.
///
/// `name` is the display label the merge derived for the block; the slot is
/// inferred from it alone, since slot suffixes belong to partition names and
/// a payload filename like `kernel_a.img` must not re-slot a `_b` partition.
/// The role looks at everything: name, device node, declared type and all
/// image filenames.
pub fn classify(name: &str, device: &str, images: &[String], kind: &str) -> Classification {
    let mut haystack = String::with_capacity(
        name.len() + device.len() + kind.len() + images.iter().map(|i| i.len() + 1).sum::<usize>() + 3,
    );
    haystack.push_str(name);
    haystack.push(' ');
    haystack.push_str(device);
    haystack.push(' ');
    haystack.push_str(kind);
    for image in images {
        haystack.push(' ');
        haystack.push_str(image);
    }
    let haystack = haystack.to_ascii_lowercase();

    let role = ROLE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(_, role)| *role)
        .unwrap_or(Role::Unknown);

    let label = name.to_ascii_lowercase();
    let slot = if SLOT_A_MARKERS.iter().any(|m| label.contains(m)) {
        0
    } else if SLOT_B_MARKERS.iter().any(|m| label.contains(m)) {
        1
    } else {
        -1
    };

    let name_dev = format!("{} {}", name, device).to_ascii_lowercase();
    let critical = CRITICAL_ROLES.contains(&role)
        || CRITICAL_MARKERS.iter().any(|m| name_dev.contains(m));

    Classification {
        role,
        slot,
        critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_role_priority_order() {
        // dtb keyword outranks kernel even when both are present
        let c = classify("kernel_dtb", "/dev/mmcblk0p4", &[], "");
        assert_eq!(c.role, Role::Dtb);

        // bootloader outranks everything
        let c = classify("uboot_kernel", "", &[], "");
        assert_eq!(c.role, Role::Bootloader);
    }

    #[test]
    fn test_role_from_images_and_type() {
        let c = classify("p7", "/dev/mmcblk0p7", &images(&["core.squashfs"]), "raw");
        assert_eq!(c.role, Role::Rootfs);

        let c = classify("p2", "/dev/mmcblk0p2", &images(&["uImage-5.4"]), "");
        assert_eq!(c.role, Role::Kernel);
    }

    #[test]
    fn test_role_keywords() {
        assert_eq!(classify("printer_data", "", &[], "").role, Role::Userdata);
        assert_eq!(classify("udisk", "", &[], "").role, Role::Userdata);
        assert_eq!(classify("recovery", "", &[], "").role, Role::Recovery);
        assert_eq!(classify("uboot-env", "", &[], "").role, Role::Bootloader);
        assert_eq!(classify("env", "", &[], "").role, Role::Env);
        assert_eq!(classify("vendor0", "", &[], "").role, Role::Unknown);
    }

    #[test]
    fn test_slot_markers() {
        assert_eq!(classify("rootfs_a", "", &[], "").slot, 0);
        assert_eq!(classify("rootfs_b", "", &[], "").slot, 1);
        assert_eq!(classify("SLOT_A", "", &[], "").slot, 0);
        assert_eq!(classify("rootfs", "", &[], "").slot, -1);
    }

    #[test]
    fn test_slot_ignores_image_names() {
        // the partition name decides the slot, not the payload filename
        let c = classify("kernel_b", "", &images(&["kernel_a.img"]), "");
        assert_eq!(c.slot, 1);
    }

    #[test]
    fn test_critical_roles() {
        assert!(classify("kernel_a", "", &[], "").critical);
        assert!(classify("dtb", "", &[], "").critical);
        assert!(classify("recovery", "", &[], "").critical);
        assert!(!classify("userdata", "/dev/mmcblk0p10", &[], "").critical);
        assert!(!classify("vendor0", "", &[], "").critical);
    }

    #[test]
    fn test_critical_forced_by_device_string() {
        // role is userdata, but the device node carries a boot marker
        let c = classify("udisk", "/dev/by-name/bootdata", &[], "");
        assert_eq!(c.role, Role::Userdata);
        assert!(c.critical);
    }

    #[test]
    fn test_kernel_b_scenario() {
        let c = classify("kernel_b", "/dev/mmcblk0p5", &[], "");
        assert_eq!(c.role, Role::Kernel);
        assert_eq!(c.slot, 1);
        assert!(c.critical);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Bootloader).unwrap(),
            "\"bootloader\""
        );
        assert_eq!(serde_json::to_string(&Role::Unknown).unwrap(), "\"unknown\"");
    }
}
