//! Every property id the engine defines, by name.

const KNOWN_IDS: &[(u32, &str)] = &[
    (0,       "kpidNoProperty"),
    (1,       "kpidMainSubfile"),
    (2,       "kpidHandlerItemIndex"),
    (3,       "kpidPath"),
    (4,       "kpidName"),
    (5,       "kpidExtension"),
    (6,       "kpidIsDir"),
    (7,       "kpidSize"),
    (8,       "kpidPackSize"),
    (9,       "kpidAttrib"),
    (10,      "kpidCTime"),
    (11,      "kpidATime"),
    (12,      "kpidMTime"),
    (13,      "kpidSolid"),
    (14,      "kpidCommented"),
    (15,      "kpidEncrypted"),
    (16,      "kpidSplitBefore"),
    (17,      "kpidSplitAfter"),
    (18,      "kpidDictionarySize"),
    (19,      "kpidCRC"),
    (20,      "kpidType"),
    (21,      "kpidIsAnti"),
    (22,      "kpidMethod"),
    (23,      "kpidHostOS"),
    (24,      "kpidFileSystem"),
    (25,      "kpidUser"),
    (26,      "kpidGroup"),
    (27,      "kpidBlock"),
    (28,      "kpidComment"),
    (29,      "kpidPosition"),
    (30,      "kpidPrefix"),
    (31,      "kpidNumSubDirs"),
    (32,      "kpidNumSubFiles"),
    (33,      "kpidUnpackVer"),
    (34,      "kpidVolume"),
    (35,      "kpidIsVolume"),
    (36,      "kpidOffset"),
    (37,      "kpidLinks"),
    (38,      "kpidNumBlocks"),
    (39,      "kpidNumVolumes"),
    (40,      "kpidTimeType"),
    (41,      "kpidBit64"),
    (42,      "kpidBigEndian"),
    (43,      "kpidCpu"),
    (44,      "kpidPhySize"),
    (45,      "kpidHeadersSize"),
    (46,      "kpidChecksum"),
    (47,      "kpidCharacts"),
    (48,      "kpidVa"),
    (49,      "kpidId"),
    (50,      "kpidShortName"),
    (51,      "kpidCreatorApp"),
    (52,      "kpidSectorSize"),
    (53,      "kpidPosixAttrib"),
    (54,      "kpidLink"),
    (0x1100,  "kpidTotalSize"),
    (0x1101,  "kpidFreeSpace"),
    (0x1102,  "kpidClusterSize"),
    (0x1103,  "kpidVolumeName"),
    (0x1200,  "kpidLocalName"),
    (0x1201,  "kpidProvider"),
    (0x10000, "kpidUserDefined"),
];

/// `(id, name)` for every id the engine defines, in id order.
pub fn known_ids() -> &'static [(u32, &'static str)] {
    KNOWN_IDS
}
