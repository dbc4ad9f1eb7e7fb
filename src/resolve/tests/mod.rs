mod findall;
