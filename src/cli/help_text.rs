pub(super) const ROOT_LONG_ABOUT: &str = "\
Incremental MD5 manifest maintenance for OPenn archive trees

openn-manifest keeps manifest-md5.txt in the Walters manuscript descriptions
directory current, and regenerates the Walters contents CSV. Both files are
only rewritten when their content actually changes.

The archive root is taken from --root or the OPENN_ROOT environment variable
and must contain a Data directory.

COMMANDS:

  manifest
    Checksum new and modified TEI files and schemas and publish the updated
    manifest. Files older than the current manifest are not re-read.

  contents
    Rebuild Data/0020_contents.csv from the WaltersManuscripts and
    OtherCollections item directories.

LOGGING:

  Logs go to stderr. The default level is warn; use -v, -vv or --log-level
  to change it, or RUST_LOG when neither flag is given.

EXIT CODES:

  0    Success, whether or not anything changed
  255  Any error (missing root, unreadable file, malformed manifest, ...)";

pub(super) const MANIFEST_LONG_ABOUT: &str = "\
Update the MD5 manifest of the TEI manuscript descriptions

Tracked files are the *_tei.xml files and *.rng, *.rnc, *.xsd, *.dtd and *.odd
schemas directly inside
$OPENN_ROOT/Data/0020/Data/WaltersManuscripts/ManuscriptDescriptions.

A file is checksummed when it has no manifest entry, or when its modification
time is not strictly older than the manifest's own. All other entries are kept
as they are. If nothing needed checksumming the manifest is not touched at all;
otherwise it is rewritten atomically, and only if its content differs.

The manifest format is one '<md5>  <filename>' line per file, so tracked file
names must not contain whitespace. Entries are never removed.

Running two updates against the same manifest at once is not supported.";

pub(super) const CONTENTS_LONG_ABOUT: &str = "\
Regenerate the Walters contents CSV

Writes $OPENN_ROOT/Data/0020_contents.csv with one row per item directory in
WaltersManuscripts and OtherCollections. Titles come from the <dc:title>
element of each item's data/metadata.xml; created and updated are the item
directory's modification time. The file is only replaced when the generated
CSV differs from the published one.";
