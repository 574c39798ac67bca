pub(super) const ROOT_LONG_ABOUT: &str = "\
Maintain per-directory SHA-256 checksum files across a tree

Sumtree walks a directory tree and keeps a .checksums.sha256 file in every
directory that holds files. Each checksum file lists the files directly in
its own directory, so a directory can be moved or archived together with
the checksums that describe it.

CHECKSUM FILES:

  Lines are written in the common '<digest>  <name>' layout understood by
  sha256sum -c. When reading, GNU ('<digest> *<name>') and BSD
  ('SHA256 (<name>) = <digest>') lines are accepted too, and blank lines or
  lines starting with '#' or ';' are ignored.

  A directory containing a file named .nochecksums is never processed.

COMMANDS:

  create    Hash files that have no recorded checksum yet.
  refresh   Like create, and also re-hash files modified after their
            checksum file was last written.
  reset     Throw away existing checksums and hash every file again.
  verify    Re-hash every recorded file and report differences. Every
            file ending in .sha256 is checked. Nothing is written.

OUTPUT:

  One line per notable file is printed on stdout:

    + <path>   checksum added or changed
    ? <path>   file vanished before it could be hashed
    ! <path>   file or checksum file could not be read or written
    X <path>   file content does not match its recorded checksum

  Log messages go to stderr. The exit status is 0 whenever the walk
  completes, whatever it found, and 255 if it could not run at all.

EXCLUSIONS:

  Directories named $RECYCLE.BIN or System Volume Information and files
  named desktop.ini, Thumbs.db, .DS_Store or *.sha256 are skipped. Add more
  with --exclude-dir and --exclude-file (glob patterns matched against the
  name). Hidden files and directories are skipped unless --include-hidden
  is given.

EXAMPLES:

  $ sumtree create /srv/archive
  $ sumtree -C /srv/archive refresh
  $ sumtree verify --exclude-dir cache .
";

pub(super) const CREATE_LONG_ABOUT: &str = "\
Record checksums for files that have none yet

Files already listed in a directory's checksum file are not hashed again,
even if they changed. Entries for files that no longer exist are dropped.
Written checksum files are made read-only and hidden unless --no-protect
is given.";

pub(super) const REFRESH_LONG_ABOUT: &str = "\
Like create, and also re-hash files modified after their checksum file

A file is hashed again when its modification time is later than that of
the checksum file in its directory. Files whose content turns out to be
unchanged are not reported.";

pub(super) const RESET_LONG_ABOUT: &str = "\
Discard existing checksum files and re-hash everything

Existing checksum files are not read. Every file is hashed and the checksum
file of each directory is rewritten from scratch.";

pub(super) const VERIFY_LONG_ABOUT: &str = "\
Re-hash recorded files and report mismatches, never writing anything

Every file ending in .sha256 in a processed directory is read as a checksum
file. Mismatches are reported with X, vanished files with ?, and unreadable
files or checksum files with !.";

pub(super) const LOG_LEVEL_LONG_HELP: &str = "\
Set the log level explicitly (error, warn, info, debug, trace).

Cannot be combined with -v. Takes precedence over RUST_LOG.";
