//! Auth-proxy (LemonLDAP::NG) configuration fragment.
//!
//! The fragment is a list of Perl assignments applied to the proxy configuration by the
//! moulinette tool. It points the portal at the new main domain and installs two location
//! rules: `/ynh-admin/` for the `admin` account only and `/ynh-user/` for everybody else.

use crate::domain::Domain;

const ADMIN_RULE: &str = "(?#0ynh_admin)^/ynh-admin/";
const USER_RULE: &str = "(?#0ynh_user)^/ynh-user/";

/// Render the fragment moving the proxy from `old` to `new`. Rules keyed by `old` are
/// deleted unless `old` is `default_domain`, which never had any.
#[must_use]
pub fn fragment(new: &Domain, old: &Domain, default_domain: &Domain, base_dn: &str) -> String {
    let mut lines = vec![
        format!("$tmp->{{'domain'}} = '{new}';"),
        format!("$tmp->{{'ldapBase'}} = '{base_dn}';"),
        format!("$tmp->{{'portal'}} = 'https://{new}/sso/';"),
        format!("$tmp->{{'locationRules'}}->{{'{new}'}}->{{'{ADMIN_RULE}'}} = '$uid eq \"admin\"';"),
        format!("$tmp->{{'locationRules'}}->{{'{new}'}}->{{'{USER_RULE}'}} = '$uid ne \"admin\"';"),
    ];
    if old != default_domain {
        lines.push(format!(
            "delete $tmp->{{'locationRules'}}->{{'{old}'}}->{{'{ADMIN_RULE}'}};"
        ));
        lines.push(format!(
            "delete $tmp->{{'locationRules'}}->{{'{old}'}}->{{'{USER_RULE}'}};"
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    #[test]
    fn from_default_domain_has_no_deletes() {
        let frag = fragment(
            &d("example.org"),
            &d("yunohost.org"),
            &d("yunohost.org"),
            "dc=yunohost,dc=org",
        );
        assert_eq!(
            frag,
            "$tmp->{'domain'} = 'example.org';\n\
             $tmp->{'ldapBase'} = 'dc=yunohost,dc=org';\n\
             $tmp->{'portal'} = 'https://example.org/sso/';\n\
             $tmp->{'locationRules'}->{'example.org'}->{'(?#0ynh_admin)^/ynh-admin/'} = '$uid eq \"admin\"';\n\
             $tmp->{'locationRules'}->{'example.org'}->{'(?#0ynh_user)^/ynh-user/'} = '$uid ne \"admin\"';\n"
        );
    }

    #[test]
    fn from_real_domain_deletes_old_rules() {
        let frag = fragment(
            &d("new.example"),
            &d("old.example"),
            &d("yunohost.org"),
            "dc=yunohost,dc=org",
        );
        let lines: Vec<&str> = frag.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(
            lines[5],
            "delete $tmp->{'locationRules'}->{'old.example'}->{'(?#0ynh_admin)^/ynh-admin/'};"
        );
        assert_eq!(
            lines[6],
            "delete $tmp->{'locationRules'}->{'old.example'}->{'(?#0ynh_user)^/ynh-user/'};"
        );
    }
}
